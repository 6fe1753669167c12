use crate::types::Tool;

/// Prefixes progress lines with `[name]` when several tools are processed
/// in one command, padding names to the same width.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToolPrefix {
    width: Option<usize>,
}

impl ToolPrefix {
    pub fn for_tools(tools: &[Tool]) -> Self {
        if tools.len() <= 1 {
            return Self { width: None };
        }
        Self {
            width: tools.iter().map(|t| t.name.len()).max(),
        }
    }

    pub fn line(&self, name: &str, message: &str) -> String {
        match self.width {
            Some(width) => format!("[{:<width$}] {}", name, message, width = width),
            None => message.to_string(),
        }
    }
}

/// Quote paths containing spaces so they can be pasted into a shell.
pub fn quote_if_spaced(s: &str) -> String {
    if s.contains(' ') {
        format!("\"{}\"", s)
    } else {
        s.to_string()
    }
}
