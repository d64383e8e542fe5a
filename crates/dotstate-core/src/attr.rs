//! Source-name attribute codec
//!
//! Attributes of a managed entry are encoded in its source file name:
//!
//! | Prefix / suffix | Applies to | Meaning |
//! |-----------------|------------|---------|
//! | `exact_`        | directory  | remove unmanaged children |
//! | `run_`          | file       | script; optionally followed by `once_` |
//! | `symlink_`      | file       | symlink whose contents are the link target |
//! | `encrypted_`    | file       | contents are encrypted |
//! | `private_`      | both       | no group/world permissions |
//! | `empty_`        | file       | keep the file even when empty |
//! | `executable_`   | file       | executable bits set |
//! | `dot_`          | both       | target name starts with `.` |
//! | `.tmpl`         | file       | contents are a template |

const DOT_PREFIX: &str = "dot_";
const EMPTY_PREFIX: &str = "empty_";
const ENCRYPTED_PREFIX: &str = "encrypted_";
const EXACT_PREFIX: &str = "exact_";
const EXECUTABLE_PREFIX: &str = "executable_";
const ONCE_PREFIX: &str = "once_";
const PRIVATE_PREFIX: &str = "private_";
const RUN_PREFIX: &str = "run_";
const SYMLINK_PREFIX: &str = "symlink_";
const TEMPLATE_SUFFIX: &str = ".tmpl";

/// Attributes of a source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirAttributes {
    /// Target name component
    pub name: String,
    pub exact: bool,
    pub private: bool,
}

impl DirAttributes {
    pub fn parse(source_name: &str) -> Self {
        let mut name = source_name;
        let exact = strip(&mut name, EXACT_PREFIX);
        let private = strip(&mut name, PRIVATE_PREFIX);
        Self {
            name: undot(name),
            exact,
            private,
        }
    }

    pub fn source_name(&self) -> String {
        let mut source_name = String::new();
        if self.exact {
            source_name.push_str(EXACT_PREFIX);
        }
        if self.private {
            source_name.push_str(PRIVATE_PREFIX);
        }
        source_name.push_str(&dot(&self.name));
        source_name
    }

    pub fn perm(&self) -> u32 {
        if self.private { 0o700 } else { 0o777 }
    }
}

/// What a regular file in the source directory stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFileKind {
    File,
    Script,
    Symlink,
}

/// Attributes of a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttributes {
    /// Target name component
    pub name: String,
    pub kind: SourceFileKind,
    pub empty: bool,
    pub encrypted: bool,
    pub executable: bool,
    pub once: bool,
    pub private: bool,
    pub template: bool,
}

impl FileAttributes {
    /// Attributes of a plain file named `name`.
    pub fn new(name: impl Into<String>, kind: SourceFileKind) -> Self {
        Self {
            name: name.into(),
            kind,
            empty: false,
            encrypted: false,
            executable: false,
            once: false,
            private: false,
            template: false,
        }
    }

    pub fn parse(source_name: &str) -> Self {
        let mut name = source_name;
        let mut attrs = Self::new(String::new(), SourceFileKind::File);
        if strip(&mut name, RUN_PREFIX) {
            attrs.kind = SourceFileKind::Script;
            attrs.once = strip(&mut name, ONCE_PREFIX);
        } else if strip(&mut name, SYMLINK_PREFIX) {
            attrs.kind = SourceFileKind::Symlink;
        } else {
            attrs.encrypted = strip(&mut name, ENCRYPTED_PREFIX);
            attrs.private = strip(&mut name, PRIVATE_PREFIX);
            attrs.empty = strip(&mut name, EMPTY_PREFIX);
            attrs.executable = strip(&mut name, EXECUTABLE_PREFIX);
        }
        if let Some(stem) = name.strip_suffix(TEMPLATE_SUFFIX)
            && !stem.is_empty()
        {
            attrs.template = true;
            name = stem;
        }
        attrs.name = undot(name);
        attrs
    }

    pub fn source_name(&self) -> String {
        let mut source_name = String::new();
        match self.kind {
            SourceFileKind::Script => {
                source_name.push_str(RUN_PREFIX);
                if self.once {
                    source_name.push_str(ONCE_PREFIX);
                }
            }
            SourceFileKind::Symlink => source_name.push_str(SYMLINK_PREFIX),
            SourceFileKind::File => {
                if self.encrypted {
                    source_name.push_str(ENCRYPTED_PREFIX);
                }
                if self.private {
                    source_name.push_str(PRIVATE_PREFIX);
                }
                if self.empty {
                    source_name.push_str(EMPTY_PREFIX);
                }
                if self.executable {
                    source_name.push_str(EXECUTABLE_PREFIX);
                }
            }
        }
        source_name.push_str(&dot(&self.name));
        if self.template {
            source_name.push_str(TEMPLATE_SUFFIX);
        }
        source_name
    }

    /// Target permission bits before the umask is applied.
    pub fn perm(&self) -> u32 {
        let perm = if self.executable { 0o777 } else { 0o666 };
        if self.private { perm & 0o700 } else { perm }
    }
}

fn strip(name: &mut &str, prefix: &str) -> bool {
    match name.strip_prefix(prefix) {
        Some(rest) => {
            *name = rest;
            true
        }
        None => false,
    }
}

fn undot(name: &str) -> String {
    match name.strip_prefix(DOT_PREFIX) {
        Some(rest) => format!(".{rest}"),
        None => name.to_string(),
    }
}

fn dot(name: &str) -> String {
    match name.strip_prefix('.') {
        Some(rest) => format!("{DOT_PREFIX}{rest}"),
        None => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("dot_bashrc", ".bashrc", 0o666)]
    #[case("executable_dot_local_run", ".local_run", 0o777)]
    #[case("private_dot_netrc", ".netrc", 0o600)]
    #[case("empty_dot_hushlogin", ".hushlogin", 0o666)]
    #[case("encrypted_private_dot_token", ".token", 0o600)]
    #[case("plain", "plain", 0o666)]
    fn file_names_and_perms(#[case] source_name: &str, #[case] name: &str, #[case] perm: u32) {
        let attrs = FileAttributes::parse(source_name);
        assert_eq!(attrs.name, name);
        assert_eq!(attrs.perm(), perm);
        assert_eq!(attrs.source_name(), source_name);
    }

    #[test]
    fn parse_private_executable_dotfile_template() {
        let attrs = FileAttributes::parse("private_executable_dot_profile.tmpl");
        assert_eq!(attrs.name, ".profile");
        assert_eq!(attrs.kind, SourceFileKind::File);
        assert!(attrs.private && attrs.executable && attrs.template);
        assert!(!attrs.encrypted && !attrs.empty);
        assert_eq!(attrs.perm(), 0o700);
    }

    #[test]
    fn run_prefix_wins_over_file_prefixes() {
        let attrs = FileAttributes::parse("run_once_private_setup.sh");
        assert_eq!(attrs.kind, SourceFileKind::Script);
        assert!(attrs.once);
        // private_ is not an attribute of scripts
        assert_eq!(attrs.name, "private_setup.sh");
    }

    #[test]
    fn symlink_prefix() {
        let attrs = FileAttributes::parse("symlink_dot_vimrc");
        assert_eq!(attrs.kind, SourceFileKind::Symlink);
        assert_eq!(attrs.name, ".vimrc");
        assert_eq!(attrs.source_name(), "symlink_dot_vimrc");
    }

    #[test]
    fn bare_tmpl_is_not_a_template() {
        let attrs = FileAttributes::parse(".tmpl");
        assert!(!attrs.template);
    }

    #[test]
    fn dir_attributes() {
        let attrs = DirAttributes::parse("exact_private_dot_ssh");
        assert_eq!(
            attrs,
            DirAttributes {
                name: ".ssh".into(),
                exact: true,
                private: true
            }
        );
        assert_eq!(attrs.perm(), 0o700);
        assert_eq!(attrs.source_name(), "exact_private_dot_ssh");
    }
}
