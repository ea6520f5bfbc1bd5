use console::{Emoji, style};

pub static SUCCESS_ICON: Emoji<'_, '_> = Emoji("✅ ", "");
pub static INFO_ICON: Emoji<'_, '_> = Emoji("ℹ️  ", "");
pub static WARN_ICON: Emoji<'_, '_> = Emoji("⚠️  ", "");
pub static ERROR_ICON: Emoji<'_, '_> = Emoji("❌ ", "");

pub fn print_success(msg: &str) {
    println!("{} {}", SUCCESS_ICON, style(msg).green());
}

pub fn print_info(msg: &str) {
    println!("{} {}", INFO_ICON, style(msg).blue());
}

pub fn print_warn(msg: &str) {
    println!("{} {}", WARN_ICON, style(msg).yellow());
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", ERROR_ICON, style(msg).red().bold());
}

/// Pretty-prints any serializable value as indented JSON.
pub fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => print_error(&format!("Failed to render JSON: {}", e)),
    }
}

enum GuideLine {
    Command(String, String),
    Status(String, String),
    Text(String),
    Info(String),
    Hint(String, String),
    Blank,
}

/// A titled block of help or status lines, rendered with aligned columns.
pub struct GuideSection {
    title: String,
    lines: Vec<GuideLine>,
}

impl GuideSection {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            lines: Vec::new(),
        }
    }

    pub fn command(mut self, name: &str, description: &str) -> Self {
        self.lines
            .push(GuideLine::Command(name.to_string(), description.to_string()));
        self
    }

    pub fn status(mut self, label: &str, value: &str) -> Self {
        self.lines
            .push(GuideLine::Status(label.to_string(), value.to_string()));
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.lines.push(GuideLine::Text(text.to_string()));
        self
    }

    pub fn info(mut self, text: &str) -> Self {
        self.lines.push(GuideLine::Info(text.to_string()));
        self
    }

    pub fn hint(mut self, command: &str, description: &str) -> Self {
        self.lines
            .push(GuideLine::Hint(command.to_string(), description.to_string()));
        self
    }

    pub fn blank(mut self) -> Self {
        self.lines.push(GuideLine::Blank);
        self
    }

    pub fn render(&self) -> String {
        let command_width = self
            .lines
            .iter()
            .filter_map(|l| match l {
                GuideLine::Command(name, _) => Some(name.len()),
                _ => None,
            })
            .max()
            .unwrap_or(0);
        let status_width = self
            .lines
            .iter()
            .filter_map(|l| match l {
                GuideLine::Status(label, _) => Some(label.len()),
                _ => None,
            })
            .max()
            .unwrap_or(0);

        let mut out = format!("\n {}\n", style(&self.title).bold().cyan());
        for line in &self.lines {
            match line {
                GuideLine::Command(name, description) => out.push_str(&format!(
                    "   {}  {}\n",
                    style(format!("{:<w$}", name, w = command_width)).green(),
                    description
                )),
                GuideLine::Status(label, value) => out.push_str(&format!(
                    "   {}  {}\n",
                    style(format!("{:<w$}", label, w = status_width)).bold(),
                    value
                )),
                GuideLine::Text(text) => out.push_str(&format!("   {}\n", text)),
                GuideLine::Info(text) => {
                    out.push_str(&format!("   {}{}\n", INFO_ICON, style(text).dim()))
                }
                GuideLine::Hint(command, description) => {
                    if description.is_empty() {
                        out.push_str(&format!("   $ {}\n", style(command).cyan()));
                    } else {
                        out.push_str(&format!(
                            "   $ {}  {}\n",
                            style(command).cyan(),
                            style(description).dim()
                        ));
                    }
                }
                GuideLine::Blank => out.push('\n'),
            }
        }
        out
    }

    pub fn print(&self) {
        print!("{}", self.render());
    }
}

pub fn print_banner() {
    let lines: &[&str] = &[
        "       _ _                  ",
        "  __ _| | | ___  _ __ __ _  ",
        " / _` | | |/ _ \\| '__/ _` | ",
        "| (_| | | | (_) | | | (_| | ",
        " \\__,_|_|_|\\___/|_|  \\__,_| ",
    ];

    // Gradient: #34d399 → #22d3ee → #818cf8 (diagonal top-left → bottom-right)
    let stops: [(u8, u8, u8); 3] = [(52, 211, 153), (34, 211, 238), (129, 140, 248)];
    let max_w = 28u32;
    let max_d = max_w + 4 * 10;

    println!();
    for (y, line) in lines.iter().enumerate() {
        for (x, ch) in line.chars().enumerate() {
            if ch == ' ' {
                print!(" ");
                continue;
            }
            let d = ((x as u32 + y as u32 * 10) * 1000 / max_d).min(1000);
            let (r, g, b) = if d <= 500 {
                lerp_color(stops[0], stops[1], d * 2)
            } else {
                lerp_color(stops[1], stops[2], (d - 500) * 2)
            };
            print!("\x1b[38;2;{};{};{}m{}", r, g, b, ch);
        }
        println!();
    }
    print!("\x1b[0m");

    println!("\x1b[38;2;34;211;238mStrategies in, audited outcomes out.\x1b[0m\n");
}

fn lerp_color(a: (u8, u8, u8), b: (u8, u8, u8), t: u32) -> (u8, u8, u8) {
    let r = (a.0 as u32 * (1000 - t) + b.0 as u32 * t) / 1000;
    let g = (a.1 as u32 * (1000 - t) + b.1 as u32 * t) / 1000;
    let b_val = (a.2 as u32 * (1000 - t) + b.2 as u32 * t) / 1000;
    (r as u8, g as u8, b_val as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guide_section_aligns_columns() {
        console::set_colors_enabled(false);
        let rendered = GuideSection::new("Execution")
            .status("id", "e1")
            .status("status", "success")
            .blank()
            .hint("allora execution show e1", "")
            .render();
        assert!(rendered.contains("Execution"));
        assert!(rendered.contains("   id      e1"));
        assert!(rendered.contains("   status  success"));
        assert!(rendered.contains("$ allora execution show e1"));
    }

    #[test]
    fn commands_share_one_width() {
        console::set_colors_enabled(false);
        let rendered = GuideSection::new("Strategies")
            .command("run", "Run a strategy")
            .command("generate", "Draft a strategy from a prompt")
            .render();
        assert!(rendered.contains("   run       Run a strategy"));
        assert!(rendered.contains("   generate  Draft a strategy"));
    }
}
