//! Startup ASCII banner (VPASS TALLY).

use crossterm::ExecutableCommand;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use figlet_rs::FIGfont;
use std::io::{Write, stdout};

/// Card-brand green (#0f9d58-ish, readable on dark and light terminals).
const BANNER_COLOR: Color = Color::Rgb {
    r: 0x1a,
    g: 0xbc,
    b: 0x7a,
};

/// Prints the welcome banner in standard figlet lettering, then the version
/// line. Falls back to a plain line when the font fails to load.
pub fn print_welcome() {
    let mut out = stdout();
    let art = match FIGfont::standard() {
        Ok(font) => font
            .convert("VPASS TALLY")
            .map(|figure| figure.to_string())
            .unwrap_or_else(|| "VPASS TALLY\n".to_string()),
        Err(_) => "VPASS TALLY\n".to_string(),
    };

    let _ = out.execute(SetForegroundColor(BANNER_COLOR));
    for line in art.lines() {
        let _ = out.execute(Print(line));
        let _ = out.execute(Print("\r\n"));
    }
    let _ = out.execute(Print(format!("v{}\r\n", env!("CARGO_PKG_VERSION"))));
    let _ = out.execute(ResetColor);
    let _ = out.flush();
}
