//! Typed script builders
//!
//! Scripts are assembled as ordered directive lists and rendered to text at
//! the end. Ordering constraints that the remote side depends on (package
//! index refresh before apt installs, snap seeding before snap installs) are
//! enforced here rather than left to the caller.

use std::fmt::Write as _;

/// Host-side shell directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellDirective {
    Blank,
    Comment(String),
    Line(String),
    /// Write `body` verbatim to `path` through a quoted heredoc
    File {
        path: String,
        delimiter: String,
        body: String,
    },
    AptRefresh,
    AptInstall(Vec<String>),
    SnapSeedWait,
    SnapInstall { name: String, classic: bool },
}

/// Host bash script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellScript {
    errexit: bool,
    directives: Vec<ShellDirective>,
    apt_ready: bool,
    snap_ready: bool,
}

impl ShellScript {
    /// Script that aborts on the first failing command
    pub fn new() -> Self {
        Self {
            errexit: true,
            directives: Vec::new(),
            apt_ready: false,
            snap_ready: false,
        }
    }

    /// Script that keeps going after failures; used for probes whose
    /// failures are reported through output markers
    pub fn lenient() -> Self {
        Self {
            errexit: false,
            ..Self::new()
        }
    }

    pub fn directives(&self) -> &[ShellDirective] {
        &self.directives
    }

    pub fn blank(&mut self) -> &mut Self {
        self.directives.push(ShellDirective::Blank);
        self
    }

    pub fn comment(&mut self, text: impl Into<String>) -> &mut Self {
        self.directives.push(ShellDirective::Comment(text.into()));
        self
    }

    pub fn line(&mut self, command: impl Into<String>) -> &mut Self {
        self.directives.push(ShellDirective::Line(command.into()));
        self
    }

    pub fn file(&mut self, path: impl Into<String>, body: impl Into<String>) -> &mut Self {
        self.file_with_delimiter(path, "EOF", body)
    }

    pub fn file_with_delimiter(
        &mut self,
        path: impl Into<String>,
        delimiter: impl Into<String>,
        body: impl Into<String>,
    ) -> &mut Self {
        self.directives.push(ShellDirective::File {
            path: path.into(),
            delimiter: delimiter.into(),
            body: body.into(),
        });
        self
    }

    /// Install apt packages; the first call refreshes the package index
    pub fn apt_install<I, S>(&mut self, packages: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.apt_ready {
            self.directives.push(ShellDirective::AptRefresh);
            self.apt_ready = true;
        }
        self.directives.push(ShellDirective::AptInstall(
            packages.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// Install a snap; the first call waits for snapd seeding
    pub fn snap_install(&mut self, name: impl Into<String>, classic: bool) -> &mut Self {
        if !self.snap_ready {
            self.directives.push(ShellDirective::SnapSeedWait);
            self.snap_ready = true;
        }
        self.directives.push(ShellDirective::SnapInstall {
            name: name.into(),
            classic,
        });
        self
    }

    /// Append a router script, written into the container and executed there
    pub fn run_in_router(&mut self, script_name: &str, script: &VyosScript) -> &mut Self {
        let host_path = format!("/tmp/{}.sh", script_name);
        self.file_with_delimiter(&host_path, "VYOSEOF", script.render())
            .blank()
            .comment("Push and execute in the router container")
            .line(format!("lxc file push {} router{}", host_path, host_path))
            .line(format!("lxc exec router -- chmod +x {}", host_path))
            .line(format!("lxc exec router -- {}", host_path))
    }

    pub fn render(&self) -> String {
        let mut out = String::from("#!/bin/bash\n");
        if self.errexit {
            out.push_str("set -e\n");
        }
        out.push('\n');

        for directive in &self.directives {
            match directive {
                ShellDirective::Blank => out.push('\n'),
                ShellDirective::Comment(text) => {
                    let _ = writeln!(out, "# {}", text);
                }
                ShellDirective::Line(command) => {
                    let _ = writeln!(out, "{}", command);
                }
                ShellDirective::File {
                    path,
                    delimiter,
                    body,
                } => {
                    let _ = writeln!(out, "cat > {} <<'{}'", path, delimiter);
                    out.push_str(body);
                    if !body.ends_with('\n') {
                        out.push('\n');
                    }
                    let _ = writeln!(out, "{}", delimiter);
                }
                ShellDirective::AptRefresh => out.push_str("apt-get update -y\n"),
                ShellDirective::AptInstall(packages) => {
                    let _ = writeln!(out, "apt-get install -y {}", packages.join(" "));
                }
                ShellDirective::SnapSeedWait => {
                    out.push_str("snap wait system seed.loaded\n");
                    out.push_str("snap refresh --hold=forever\n");
                }
                ShellDirective::SnapInstall { name, classic } => {
                    if *classic {
                        let _ = writeln!(out, "snap install {} --classic", name);
                    } else {
                        let _ = writeln!(out, "snap install {}", name);
                    }
                }
            }
        }
        out
    }
}

impl Default for ShellScript {
    fn default() -> Self {
        Self::new()
    }
}

/// Router configuration directive
///
/// Only additive `set` commands exist; a router script cannot express a
/// removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VyosDirective {
    Blank,
    Comment(String),
    Set(String),
}

/// Router configuration-mode script, committed and saved on completion
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VyosScript {
    directives: Vec<VyosDirective>,
}

impl VyosScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn directives(&self) -> &[VyosDirective] {
        &self.directives
    }

    /// Start a commented section
    pub fn section(&mut self, title: impl Into<String>) -> &mut Self {
        if !self.directives.is_empty() {
            self.directives.push(VyosDirective::Blank);
        }
        self.directives.push(VyosDirective::Comment(title.into()));
        self
    }

    /// `set <path>`
    pub fn set(&mut self, path: impl Into<String>) -> &mut Self {
        self.directives.push(VyosDirective::Set(path.into()));
        self
    }

    /// Configuration paths in emission order, without the `set` keyword
    pub fn set_paths(&self) -> impl Iterator<Item = &str> {
        self.directives.iter().filter_map(|d| match d {
            VyosDirective::Set(path) => Some(path.as_str()),
            _ => None,
        })
    }

    pub fn render(&self) -> String {
        let mut out = String::from(
            "#!/bin/vbash\nsource /opt/vyatta/etc/functions/script-template\nconfigure\n\n",
        );
        for directive in &self.directives {
            match directive {
                VyosDirective::Blank => out.push('\n'),
                VyosDirective::Comment(text) => {
                    let _ = writeln!(out, "# {}", text);
                }
                VyosDirective::Set(path) => {
                    let _ = writeln!(out, "set {}", path);
                }
            }
        }
        out.push_str("\ncommit\nsave\nexit\n");
        out
    }
}
