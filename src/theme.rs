pub mod catppuccin {
    use nu_ansi_term::Color;
    pub struct Mocha;
    impl Mocha {
        // Base colors
        pub const TEXT: Color = Color::Rgb(205, 214, 244);
        pub const SUBTEXT0: Color = Color::Rgb(166, 173, 200);
        pub const SURFACE2: Color = Color::Rgb(108, 112, 134);  // Subtle dim

        // Accents
        pub const RED: Color = Color::Rgb(243, 139, 168);
        pub const GREEN: Color = Color::Rgb(166, 227, 161);
        pub const YELLOW: Color = Color::Rgb(249, 226, 175);
        pub const MAUVE: Color = Color::Rgb(203, 166, 247);
        pub const PEACH: Color = Color::Rgb(250, 179, 135);
        pub const TEAL: Color = Color::Rgb(148, 226, 213);
        pub const SKY: Color = Color::Rgb(137, 220, 235);
    }
}

use nu_ansi_term::Style;

use crate::instruction::Instruction;
use catppuccin::Mocha as P;

/// Colour per instruction family:
/// `> <` movement, `+ -` data, `. ,` I/O, `[ ]` flow control.
pub fn instruction_style(instr: Instruction) -> Style {
    let color = match instr {
        Instruction::IncPtr => P::SKY,
        Instruction::DecPtr => P::TEAL,
        Instruction::IncByte => P::GREEN,
        Instruction::DecByte => P::RED,
        Instruction::Output => P::YELLOW,
        Instruction::Input => P::PEACH,
        Instruction::LoopOpen | Instruction::LoopClose => P::MAUVE,
    };
    Style::new().fg(color).bold()
}

pub fn error_style() -> Style {
    Style::new().fg(P::RED).bold()
}

pub fn heading_style() -> Style {
    Style::new().fg(P::TEXT).bold()
}

pub fn dim_style() -> Style {
    Style::new().fg(P::SURFACE2)
}

pub fn label_style() -> Style {
    Style::new().fg(P::SUBTEXT0)
}
