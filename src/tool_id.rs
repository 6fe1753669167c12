use crate::error::{Error, Result};
use crate::types::Tool;

/// Parse a `name[@version]` command line argument into a tool for the given
/// platform.
pub fn parse_tool_arg(arg: &str, os: &str, arch: &str, version_allowed: bool) -> Result<Tool> {
    if arg.is_empty() {
        return Err(Error::InvalidArgument(
            "tool name cannot be empty".to_string(),
        ));
    }

    if arg.starts_with('-') {
        return Err(Error::InvalidArgument(format!(
            "invalid tool '{}', it looks like a CLI flag",
            arg
        )));
    }

    let mut parts = arg.splitn(2, '@');
    let name = parts.next().unwrap_or_default();
    let mut tool = Tool::new(name, os, arch);

    if let Some(version) = parts.next() {
        if !version_allowed {
            return Err(Error::InvalidArgument(
                "please don't specify a tool version".to_string(),
            ));
        }
        tool.version = version.to_string();
    }

    Ok(tool)
}

pub fn parse_tool_args(
    args: &[String],
    os: &str,
    arch: &str,
    version_allowed: bool,
) -> Result<Vec<Tool>> {
    args.iter()
        .map(|arg| parse_tool_arg(arg, os, arch, version_allowed))
        .collect()
}

/// Drop `@version` suffixes, used to suggest a corrected command line.
pub fn strip_versions(args: &[String]) -> Vec<String> {
    args.iter()
        .map(|arg| arg.split('@').next().unwrap_or(arg).to_string())
        .collect()
}
