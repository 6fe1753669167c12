use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// An isolated toolctl environment: its own HOME, config directory, local
/// API directory and install directory.
#[allow(dead_code)]
pub struct TestContext {
    pub _temp_dir: TempDir,
    pub api_dir: PathBuf,
    pub install_dir: PathBuf,
    pub bin_path: PathBuf,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let api_dir = temp_dir.path().join("api");
        let install_dir = temp_dir.path().join("bin");
        fs::create_dir_all(&api_dir).expect("Failed to create api dir");
        fs::create_dir_all(&install_dir).expect("Failed to create install dir");

        Self {
            _temp_dir: temp_dir,
            api_dir,
            install_dir,
            bin_path: PathBuf::from(env!("CARGO_BIN_EXE_toolctl")),
        }
    }

    pub fn root(&self) -> &Path {
        self._temp_dir.path()
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::new(&self.bin_path);
        cmd.env_remove("RUST_LOG");
        cmd.env_remove("TOOLCTL_REMOTE_API_BASE_URL");
        cmd.env("HOME", self.root());
        cmd.env("XDG_CONFIG_HOME", self.root().join("config"));
        cmd.env("TOOLCTL_INSTALL_DIR", &self.install_dir);
        cmd.env("TOOLCTL_LOCAL_API_BASE_PATH", &self.api_dir);
        cmd.env("PATH", &self.install_dir);
        cmd
    }

    /// Run with the local API selected.
    pub fn run(&self, args: &[&str]) -> CommandOutput {
        self.cmd()
            .arg("--local")
            .args(args)
            .output()
            .expect("Failed to run toolctl")
            .into()
    }

    pub fn write_record(&self, path: &str, yaml: &str) {
        let full = self.api_dir.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, yaml).unwrap();
    }

    pub fn read_record(&self, path: &str) -> String {
        fs::read_to_string(self.api_dir.join(path)).unwrap()
    }

    pub fn add_tool(&self, name: &str, template: &str) {
        self.write_record(
            &format!("{}/meta.yaml", name),
            &format!(
                "description: {name} test tool\ndownloadURLTemplate: {template}\nhomepage: https://example.com/{name}\nversionArgs:\n- --version\n",
            ),
        );
    }

    pub fn add_release(&self, name: &str, earliest: &str, latest: &str, version: &str, url: &str, artifact: &[u8]) {
        let (os, arch) = host_platform();
        self.write_record(
            &format!("{}/{}-{}/meta.yaml", name, os, arch),
            &format!("version:\n  earliest: {}\n  latest: {}\n", earliest, latest),
        );
        self.write_record(
            &format!("{}/{}-{}/{}.yaml", name, os, arch, version),
            &format!("url: {}\nsha256: {}\n", url, sha256_hex(artifact)),
        );
    }

    #[cfg(unix)]
    pub fn install_fake(&self, dir: &Path, name: &str, version: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, fake_binary(version)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }
}

/// os/arch names as used in the metadata store.
pub fn host_platform() -> (&'static str, &'static str) {
    let os = match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    };
    let arch = match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        other => other,
    };
    (os, arch)
}

pub fn fake_binary(version: &str) -> String {
    format!("#!/bin/sh\necho \"fake version {}\"\n", version)
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[allow(dead_code)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            status: output.status,
        }
    }
}

#[allow(dead_code)]
impl CommandOutput {
    pub fn assert_success(&self) -> &Self {
        if !self.status.success() {
            panic!(
                "Command failed with status {:?}\nstdout: {}\nstderr: {}",
                self.status.code(),
                self.stdout,
                self.stderr
            );
        }
        self
    }

    pub fn assert_failure(&self) -> &Self {
        assert!(
            !self.status.success(),
            "Command unexpectedly succeeded\nstdout: {}",
            self.stdout
        );
        self
    }

    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Stdout did not contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Stderr did not contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}
