//! Download URL templates.
//!
//! Catalog authors write templates in the Go text/template dialect, e.g.
//! `https://github.com/derailed/k9s/releases/download/v{{.Version}}/k9s_{{.OS | Title}}_{{.Arch | X86_64}}.tar.gz`.
//! Only the subset that catalogs use is supported: field references, helper
//! pipelines and single-argument helper calls.

use crate::error::{Error, Result};
use crate::types::Tool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Os,
    Arch,
    Version,
}

impl Field {
    fn parse(token: &str) -> Result<Self> {
        match token {
            ".Name" => Ok(Field::Name),
            ".OS" => Ok(Field::Os),
            ".Arch" => Ok(Field::Arch),
            ".Version" => Ok(Field::Version),
            _ => Err(Error::Template(format!("unknown field '{}'", token))),
        }
    }

    fn value<'a>(&self, tool: &'a Tool) -> &'a str {
        match self {
            Field::Name => &tool.name,
            Field::Os => &tool.os,
            Field::Arch => &tool.arch,
            Field::Version => &tool.version,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Helper {
    DefaultAmd64,
    MacOs,
    Title,
    X86_64,
    Aarch64,
    Lower,
    Upper,
    ArchiveExt,
}

impl Helper {
    fn parse(token: &str) -> Result<Self> {
        match token {
            "DefaultAMD64" => Ok(Helper::DefaultAmd64),
            "MacOS" => Ok(Helper::MacOs),
            "Title" => Ok(Helper::Title),
            "X86_64" => Ok(Helper::X86_64),
            "Aarch64" => Ok(Helper::Aarch64),
            "Lower" => Ok(Helper::Lower),
            "Upper" => Ok(Helper::Upper),
            "ArchiveExt" => Ok(Helper::ArchiveExt),
            _ => Err(Error::Template(format!("unknown function '{}'", token))),
        }
    }

    fn apply(&self, input: &str) -> String {
        match self {
            Helper::DefaultAmd64 => input.replacen("amd64", "", 1),
            Helper::MacOs => input.replacen("darwin", "macOS", 1),
            Helper::Title => title_case(input),
            Helper::X86_64 => input.replacen("amd64", "x86_64", 1),
            Helper::Aarch64 => input.replacen("arm64", "aarch64", 1),
            Helper::Lower => input.to_lowercase(),
            Helper::Upper => input.to_uppercase(),
            Helper::ArchiveExt => {
                if input == "windows" {
                    "zip".to_string()
                } else {
                    "tar.gz".to_string()
                }
            }
        }
    }
}

fn title_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut at_word_start = true;
    for c in input.chars() {
        if at_word_start && c.is_alphabetic() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = !c.is_alphanumeric();
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Action { field: Field, helpers: Vec<Helper> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadUrlTemplate {
    segments: Vec<Segment>,
}

impl DownloadUrlTemplate {
    pub fn parse(source: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut rest = source;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let after_open = &rest[start + 2..];
            let end = after_open
                .find("}}")
                .ok_or_else(|| Error::Template(format!("unclosed action in '{}'", source)))?;
            segments.push(parse_action(after_open[..end].trim())?);
            rest = &after_open[end + 2..];
        }

        if rest.contains("}}") {
            return Err(Error::Template(format!("unexpected '}}}}' in '{}'", source)));
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { segments })
    }

    pub fn render(&self, tool: &Tool) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Action { field, helpers } => {
                    let value = helpers
                        .iter()
                        .fold(field.value(tool).to_string(), |acc, helper| {
                            helper.apply(&acc)
                        });
                    out.push_str(&value);
                }
            }
        }
        out
    }
}

/// An action is either `.Field | Helper | Helper` or `Helper .Field`.
fn parse_action(action: &str) -> Result<Segment> {
    if action.is_empty() {
        return Err(Error::Template("empty action".to_string()));
    }

    let mut stages = action.split('|').map(str::trim);
    let head = stages.next().unwrap_or_default();
    let words: Vec<&str> = head.split_whitespace().collect();

    let (field, mut helpers) = match words.as_slice() {
        [field] => (Field::parse(field)?, Vec::new()),
        [helper, field] => (Field::parse(field)?, vec![Helper::parse(helper)?]),
        _ => {
            return Err(Error::Template(format!(
                "unsupported action '{{{{{}}}}}'",
                action
            )))
        }
    };

    for stage in stages {
        helpers.push(Helper::parse(stage)?);
    }

    Ok(Segment::Action { field, helpers })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> Tool {
        Tool::new("k9s", "darwin", "amd64").with_version("0.25.18")
    }

    #[test]
    fn test_render_plain_fields() {
        let template =
            DownloadUrlTemplate::parse("https://x/{{.OS}}/{{.Arch}}/{{.Version}}/{{.Name}}").unwrap();
        assert_eq!(template.render(&tool()), "https://x/darwin/amd64/0.25.18/k9s");
    }

    #[test]
    fn test_render_pipelines_and_calls() {
        let template = DownloadUrlTemplate::parse(
            "https://github.com/derailed/k9s/releases/download/v{{.Version}}/k9s_{{ .OS | Title }}_{{X86_64 .Arch}}.tar.gz",
        )
        .unwrap();
        assert_eq!(
            template.render(&tool()),
            "https://github.com/derailed/k9s/releases/download/v0.25.18/k9s_Darwin_x86_64.tar.gz"
        );
    }

    #[test]
    fn test_helpers() {
        assert_eq!(Helper::MacOs.apply("darwin"), "macOS");
        assert_eq!(Helper::DefaultAmd64.apply("amd64"), "");
        assert_eq!(Helper::DefaultAmd64.apply("arm64"), "arm64");
        assert_eq!(Helper::Aarch64.apply("arm64"), "aarch64");
        assert_eq!(Helper::Title.apply("linux"), "Linux");
        assert_eq!(Helper::Upper.apply("linux"), "LINUX");
        assert_eq!(Helper::ArchiveExt.apply("windows"), "zip");
        assert_eq!(Helper::ArchiveExt.apply("linux"), "tar.gz");
    }

    #[test]
    fn test_chained_helpers() {
        let template = DownloadUrlTemplate::parse("{{.OS | MacOS | Lower}}").unwrap();
        assert_eq!(template.render(&tool()), "macos");
    }

    #[test]
    fn test_parse_errors() {
        assert!(DownloadUrlTemplate::parse("https://x/{{.ToolName}}").is_err());
        assert!(DownloadUrlTemplate::parse("https://x/{{.OS | Shout}}").is_err());
        assert!(DownloadUrlTemplate::parse("https://x/{{.OS").is_err());
        assert!(DownloadUrlTemplate::parse("https://x/{{}}").is_err());
    }
}
