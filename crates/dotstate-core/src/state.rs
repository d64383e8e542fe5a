//! The target state
//!
//! A [`TargetState`] holds every managed entry keyed by target name. It is
//! loaded from the source directory, grown by [`TargetState::add`] during
//! capture, and applied to the destination directory.

use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use dotstate_fs::{FileInfo, FileKind, FileSystem, Mutator, NormalizedPath, validate_relative_path};

use crate::attr::{DirAttributes, FileAttributes, SourceFileKind};
use crate::concrete::ConcreteValue;
use crate::entry::{Directory, Entry, File, FileFlags, Script, Symlink};
use crate::ignore::{IGNORE_FILE, IgnoreMatcher, PatternIgnore};
use crate::template::{DataTemplates, Templates, auto_template};
use crate::{Encryptor, Error, Result};

/// Umask used when none is configured.
pub const DEFAULT_UMASK: u32 = 0o022;

/// Options controlling how [`TargetState::add`] encodes new source entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AddOptions {
    /// Add empty files instead of skipping them
    pub empty: bool,
    /// Store file contents encrypted
    pub encrypt: bool,
    /// Mark added directories exact
    pub exact: bool,
    /// Mark added files and symlinks as templates
    pub template: bool,
    /// Replace known data values with template variables
    pub auto_template: bool,
}

/// Every managed entry, plus what is needed to load, add and apply them.
pub struct TargetState {
    source_dir: PathBuf,
    dest_dir: PathBuf,
    umask: u32,
    data: BTreeMap<String, String>,
    templates: Rc<dyn Templates>,
    encryptor: Option<Rc<dyn Encryptor>>,
    ignore: Box<dyn IgnoreMatcher>,
    entries: BTreeMap<String, Entry>,
}

impl TargetState {
    pub fn new(source_dir: impl Into<PathBuf>, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_dir: source_dir.into(),
            dest_dir: dest_dir.into(),
            umask: DEFAULT_UMASK,
            data: BTreeMap::new(),
            templates: Rc::new(DataTemplates::default()),
            encryptor: None,
            ignore: Box::new(PatternIgnore::empty()),
            entries: BTreeMap::new(),
        }
    }

    pub fn with_umask(mut self, umask: u32) -> Self {
        self.umask = umask;
        self
    }

    /// Template data; also installs [`DataTemplates`] over it.
    pub fn with_data(mut self, data: BTreeMap<String, String>) -> Self {
        self.templates = Rc::new(DataTemplates::new(data.clone()));
        self.data = data;
        self
    }

    pub fn with_templates(mut self, templates: impl Templates + 'static) -> Self {
        self.templates = Rc::new(templates);
        self
    }

    pub fn with_encryptor(mut self, encryptor: impl Encryptor + 'static) -> Self {
        self.encryptor = Some(Rc::new(encryptor));
        self
    }

    /// Replace the ignore matcher. [`TargetState::read`] overrides it when
    /// the source directory has an ignore file.
    pub fn with_ignore(mut self, ignore: impl IgnoreMatcher + 'static) -> Self {
        self.ignore = Box::new(ignore);
        self
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    pub fn umask(&self) -> u32 {
        self.umask
    }

    pub fn get(&self, target_name: &str) -> Option<&Entry> {
        self.entries.get(target_name)
    }

    /// Entries in target name order; parents come before their children.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load the ignore file and every entry from the source directory.
    ///
    /// Names starting with `.` are not entries. A missing source directory
    /// yields an empty state.
    pub fn read(&mut self, fs: &dyn FileSystem) -> Result<()> {
        match fs.lstat(&self.source_dir) {
            Ok(_) => {}
            Err(err) if err.is_not_found() => {
                tracing::debug!(source_dir = %self.source_dir.display(), "no source directory");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        }
        self.read_ignore(fs)?;

        let source_root = NormalizedPath::new(&self.source_dir);
        // Source directory name -> target directory name
        let mut dir_targets: HashMap<String, String> = HashMap::new();
        let mut walk = fs.walk(&self.source_dir);
        while let Some(node) = walk.next() {
            let node = node?;
            if node.depth == 0 {
                continue;
            }
            let normalized = NormalizedPath::new(&node.path);
            let Some(source_name) = normalized.strip_prefix(&source_root) else {
                continue;
            };
            let (parent_source, base) = split_last(source_name);
            if base.starts_with('.') {
                if node.info.is_dir() {
                    walk.skip_subtree();
                }
                continue;
            }
            let parent_target = match parent_source {
                None => String::new(),
                Some(parent) => match dir_targets.get(parent) {
                    Some(target) => target.clone(),
                    None => continue,
                },
            };

            match node.info.kind {
                FileKind::Dir => {
                    let attrs = DirAttributes::parse(base);
                    let target_name = join_name(&parent_target, &attrs.name);
                    if self.ignore.matches(&target_name) {
                        walk.skip_subtree();
                        continue;
                    }
                    dir_targets.insert(source_name.to_string(), target_name.clone());
                    let dir = Directory::new(source_name, target_name, attrs.exact, attrs.perm())?;
                    self.insert(dir.into())?;
                }
                FileKind::File => {
                    let attrs = FileAttributes::parse(base);
                    let target_name = join_name(&parent_target, &attrs.name);
                    if self.ignore.matches(&target_name) {
                        continue;
                    }
                    let raw = fs.read_file(&node.path)?;
                    let entry = self.source_file_entry(source_name, target_name, &attrs, raw)?;
                    self.insert(entry)?;
                }
                kind => {
                    return Err(Error::UnsupportedFileType {
                        path: node.path,
                        kind,
                    });
                }
            }
        }
        tracing::debug!(entries = self.entries.len(), "read source state");
        Ok(())
    }

    fn read_ignore(&mut self, fs: &dyn FileSystem) -> Result<()> {
        match fs.read_file(&self.source_dir.join(IGNORE_FILE)) {
            Ok(bytes) => {
                self.ignore = Box::new(PatternIgnore::parse(&String::from_utf8_lossy(&bytes))?);
                Ok(())
            }
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn source_file_entry(
        &self,
        source_name: &str,
        target_name: String,
        attrs: &FileAttributes,
        raw: Vec<u8>,
    ) -> Result<Entry> {
        let evaluate = self.contents_evaluator(source_name, attrs, raw);
        let entry = match attrs.kind {
            SourceFileKind::File => {
                let flags = FileFlags {
                    empty: attrs.empty,
                    encrypted: attrs.encrypted,
                    perm: attrs.perm(),
                    template: attrs.template,
                };
                File::deferred(source_name, target_name, flags, evaluate)?.into()
            }
            SourceFileKind::Symlink => {
                Symlink::deferred(source_name, target_name, attrs.template, move || {
                    let contents = evaluate()?;
                    Ok(String::from_utf8_lossy(&contents).trim().to_string())
                })?
                .into()
            }
            SourceFileKind::Script => {
                Script::deferred(source_name, target_name, attrs.once, attrs.template, evaluate)?
                    .into()
            }
        };
        Ok(entry)
    }

    /// Decrypt then render, on first use.
    fn contents_evaluator(
        &self,
        source_name: &str,
        attrs: &FileAttributes,
        raw: Vec<u8>,
    ) -> impl FnOnce() -> Result<Vec<u8>> + 'static {
        let name = source_name.to_string();
        let encrypted = attrs.encrypted;
        let template = attrs.template;
        let templates = Rc::clone(&self.templates);
        let encryptor = self.encryptor.clone();
        move || {
            let mut contents = raw;
            if encrypted {
                let encryptor = encryptor.ok_or_else(|| no_encryptor(&name))?;
                contents = encryptor.decrypt(&name, &contents)?;
            }
            if template {
                let source = String::from_utf8(contents).map_err(|_| Error::Template {
                    name: name.clone(),
                    message: "template is not valid UTF-8".into(),
                })?;
                contents = templates.render(&name, &source)?.into_bytes();
            }
            Ok(contents)
        }
    }

    fn insert(&mut self, entry: Entry) -> Result<()> {
        if let Some(existing) = self.entries.get(entry.target_name()) {
            return Err(Error::DuplicateTarget {
                target_name: entry.target_name().to_string(),
                first: existing.source_name().to_string(),
                second: entry.source_name().to_string(),
            });
        }
        self.entries.insert(entry.target_name().to_string(), entry);
        Ok(())
    }

    /// Drop `target_name` and everything below it.
    fn forget(&mut self, target_name: &str) {
        let prefix = format!("{target_name}/");
        self.entries
            .retain(|name, _| name != target_name && !name.starts_with(&prefix));
    }

    /// The target name of an absolute destination path.
    pub fn target_name_for(&self, path: &Path) -> Result<String> {
        let dest = NormalizedPath::new(&self.dest_dir);
        let normalized = NormalizedPath::new(path);
        match normalized.strip_prefix(&dest) {
            Some(rel) if !rel.is_empty() => {
                validate_relative_path(rel)?;
                Ok(rel.to_string())
            }
            _ => Err(Error::NotInDestDir {
                path: path.to_path_buf(),
                dest_dir: self.dest_dir.clone(),
            }),
        }
    }

    pub fn is_dest_dir(&self, path: &Path) -> bool {
        NormalizedPath::new(path) == NormalizedPath::new(&self.dest_dir)
    }

    /// Whether a destination path is excluded by the ignore matcher.
    pub fn is_ignored(&self, path: &Path) -> bool {
        let dest = NormalizedPath::new(&self.dest_dir);
        match NormalizedPath::new(path).strip_prefix(&dest) {
            Some(rel) if !rel.is_empty() => self.ignore.matches(rel),
            _ => false,
        }
    }

    pub fn source_path(&self, target_name: &str) -> Option<PathBuf> {
        self.entries
            .get(target_name)
            .map(|entry| self.source_dir.join(entry.source_name()))
    }

    /// Create the source directory and any missing ancestors.
    pub fn ensure_source_dir(&self, fs: &dyn FileSystem, mutator: &dyn Mutator) -> Result<()> {
        let mut missing = Vec::new();
        for dir in self.source_dir.ancestors() {
            match fs.lstat(dir) {
                Ok(info) if info.is_dir() => break,
                Ok(info) => {
                    return Err(Error::StateMismatch {
                        path: dir.to_path_buf(),
                        expected: FileKind::Dir,
                        found: info.kind,
                    });
                }
                Err(err) if err.is_not_found() => missing.push(dir),
                Err(err) => return Err(err.into()),
            }
        }
        for dir in missing.into_iter().rev() {
            mutator.mkdir(dir, 0o700)?;
        }
        Ok(())
    }

    /// Apply every entry in target name order.
    pub fn apply_all(&self, fs: &dyn FileSystem, mutator: &dyn Mutator) -> Result<()> {
        for entry in self.entries.values() {
            self.apply_entry(fs, mutator, entry)?;
        }
        Ok(())
    }

    /// Apply the named entries only, in the given order.
    pub fn apply_targets(
        &self,
        fs: &dyn FileSystem,
        mutator: &dyn Mutator,
        target_names: &[String],
    ) -> Result<()> {
        for target_name in target_names {
            let entry = self.entry(target_name)?;
            self.apply_entry(fs, mutator, entry)?;
        }
        Ok(())
    }

    fn entry(&self, target_name: &str) -> Result<&Entry> {
        self.entries.get(target_name).ok_or_else(|| Error::NotManaged {
            target_name: target_name.to_string(),
        })
    }

    fn apply_entry(&self, fs: &dyn FileSystem, mutator: &dyn Mutator, entry: &Entry) -> Result<()> {
        tracing::debug!(target_name = entry.target_name(), "apply");
        entry.apply(fs, mutator, &self.dest_dir, self.umask)?;
        if let Entry::Directory(dir) = entry
            && dir.exact
        {
            self.remove_unmanaged(fs, mutator, dir)?;
        }
        Ok(())
    }

    fn remove_unmanaged(
        &self,
        fs: &dyn FileSystem,
        mutator: &dyn Mutator,
        dir: &Directory,
    ) -> Result<()> {
        let dir_path = self.dest_dir.join(dir.target_name());
        let children = match fs.read_dir(&dir_path) {
            Ok(children) => children,
            // Not created yet, as under a dry run
            Err(err) if err.is_not_found() => return Ok(()),
            Err(err) => return Err(err.into()),
        };
        for child in children {
            let target_name = join_name(dir.target_name(), &child);
            if self.entries.contains_key(&target_name) || self.ignore.matches(&target_name) {
                continue;
            }
            tracing::debug!(target_name, "removing unmanaged entry of exact directory");
            mutator.remove_all(&dir_path.join(&child))?;
        }
        Ok(())
    }

    /// Evaluate every entry, stopping at the first failure.
    pub fn evaluate_all(&self) -> Result<()> {
        self.entries.values().try_for_each(Entry::evaluate)
    }

    /// Snapshot one entry; with `recursive`, directories include their children.
    pub fn concrete_value(&self, target_name: &str, recursive: bool) -> Result<ConcreteValue> {
        let entry = self.entry(target_name)?;
        let mut value = entry.concrete_value(&self.dest_dir, &self.source_dir, recursive)?;
        if let ConcreteValue::Directory(dir) = &mut value
            && let Some(children) = dir.entries.as_mut()
        {
            for child in self.children_of(target_name) {
                children.push(self.concrete_value(child, recursive)?);
            }
        }
        Ok(value)
    }

    /// Snapshot all entries: every entry flat, or only roots when `recursive`.
    pub fn concrete_values(&self, recursive: bool) -> Result<Vec<ConcreteValue>> {
        self.entries
            .keys()
            .filter(|name| {
                !recursive
                    || split_last(name)
                        .0
                        .is_none_or(|parent| !self.entries.contains_key(parent))
            })
            .map(|name| self.concrete_value(name, recursive))
            .collect()
    }

    fn children_of<'a>(&'a self, target_name: &'a str) -> impl Iterator<Item = &'a str> {
        self.entries
            .keys()
            .filter(move |name| split_last(name).0 == Some(target_name))
            .map(String::as_str)
    }

    /// Write every entry to a tar stream and return the writer.
    pub fn archive<W: Write>(&self, writer: W) -> Result<W> {
        let mut builder = tar::Builder::new(writer);
        let mut header_template = tar::Header::new_gnu();
        header_template.set_mode(0o777);
        header_template.set_mtime(chrono::Utc::now().timestamp().max(0) as u64);
        for entry in self.entries.values() {
            entry.archive(&mut builder, &header_template, self.umask)?;
        }
        builder
            .into_inner()
            .map_err(|e| Error::archive("end of archive", e))
    }

    /// Turn one destination object into source state.
    ///
    /// `info` may carry metadata the caller already has; with `follow`, a
    /// symlink is captured as the object it points to. Missing parent
    /// directories are added first. Every source change goes through
    /// `mutator`.
    pub fn add(
        &mut self,
        fs: &dyn FileSystem,
        options: &AddOptions,
        dest_path: &Path,
        info: Option<FileInfo>,
        follow: bool,
        mutator: &dyn Mutator,
    ) -> Result<()> {
        let target_name = self.target_name_for(dest_path)?;
        let info = match info {
            Some(info) if !(follow && info.is_symlink()) => info,
            _ if follow => fs.stat(dest_path)?,
            _ => fs.lstat(dest_path)?,
        };
        let (parent_target, base) = split_last(&target_name);
        let base = base.to_string();
        let parent_source = match parent_target {
            Some(parent) => self.ensure_source_parents(fs, parent, mutator)?,
            None => String::new(),
        };
        tracing::debug!(target_name, kind = %info.kind, "add");

        match info.kind {
            FileKind::Dir => {
                let attrs = DirAttributes {
                    name: base,
                    exact: options.exact,
                    private: is_private(info.perm()),
                };
                self.add_dir(&parent_source, target_name, &attrs, mutator)
            }
            FileKind::File => {
                let contents = fs.read_file(dest_path)?;
                if contents.is_empty() && !options.empty {
                    tracing::debug!(target_name, "skipping empty file");
                    return Ok(());
                }
                let mut attrs = FileAttributes::new(base, SourceFileKind::File);
                attrs.empty = contents.is_empty();
                attrs.encrypted = options.encrypt;
                attrs.executable = info.perm() & 0o111 != 0;
                attrs.private = is_private(info.perm());
                attrs.template = options.template || options.auto_template;
                self.add_file(options, &parent_source, target_name, &attrs, contents, mutator)
            }
            FileKind::Symlink => {
                let link_name = fs.read_link(dest_path)?;
                let mut attrs = FileAttributes::new(base, SourceFileKind::Symlink);
                attrs.template = options.template || options.auto_template;
                let stored = if options.auto_template {
                    auto_template(&link_name, &self.data)
                } else {
                    link_name.clone()
                };
                let source_name = join_name(&parent_source, &attrs.source_name());
                self.write_source_file(&target_name, &source_name, stored.as_bytes(), mutator)?;
                let symlink = Symlink::new(source_name, target_name, attrs.template, link_name)?;
                self.insert(symlink.into())
            }
            kind => Err(Error::UnsupportedFileType {
                path: dest_path.to_path_buf(),
                kind,
            }),
        }
    }

    /// Make sure every directory of `target_dir` is managed; returns the
    /// source name of `target_dir`.
    fn ensure_source_parents(
        &mut self,
        fs: &dyn FileSystem,
        target_dir: &str,
        mutator: &dyn Mutator,
    ) -> Result<String> {
        let mut source_parent = String::new();
        let mut target_prefix = String::new();
        for component in target_dir.split('/') {
            target_prefix = join_name(&target_prefix, component);
            let source_name = match self.entries.get(&target_prefix) {
                Some(Entry::Directory(dir)) => dir.source_name().to_string(),
                Some(other) => {
                    return Err(Error::StateMismatch {
                        path: self.source_dir.join(other.source_name()),
                        expected: FileKind::Dir,
                        found: FileKind::File,
                    });
                }
                None => {
                    let info = fs.lstat(&self.dest_dir.join(&target_prefix))?;
                    let attrs = DirAttributes {
                        name: component.to_string(),
                        exact: false,
                        private: is_private(info.perm()),
                    };
                    let source_name = join_name(&source_parent, &attrs.source_name());
                    mutator.mkdir(&self.source_dir.join(&source_name), 0o777 & !self.umask)?;
                    let dir = Directory::new(source_name.clone(), target_prefix.clone(), false, attrs.perm())?;
                    self.insert(dir.into())?;
                    source_name
                }
            };
            source_parent = source_name;
        }
        Ok(source_parent)
    }

    fn add_dir(
        &mut self,
        parent_source: &str,
        target_name: String,
        attrs: &DirAttributes,
        mutator: &dyn Mutator,
    ) -> Result<()> {
        let source_name = join_name(parent_source, &attrs.source_name());
        let source_path = self.source_dir.join(&source_name);
        let perm = 0o777 & !self.umask;
        match self.entries.get(&target_name) {
            Some(Entry::Directory(dir)) if dir.source_name() == source_name => return Ok(()),
            Some(Entry::Directory(dir)) => {
                mutator.rename(&self.source_dir.join(dir.source_name()), &source_path)?;
            }
            Some(other) => {
                mutator.remove_all(&self.source_dir.join(other.source_name()))?;
                mutator.mkdir(&source_path, perm)?;
            }
            None => mutator.mkdir(&source_path, perm)?,
        }
        // Children recorded under the old source name are stale now
        self.forget(&target_name);
        let dir = Directory::new(source_name, target_name, attrs.exact, attrs.perm())?;
        self.insert(dir.into())
    }

    fn add_file(
        &mut self,
        options: &AddOptions,
        parent_source: &str,
        target_name: String,
        attrs: &FileAttributes,
        contents: Vec<u8>,
        mutator: &dyn Mutator,
    ) -> Result<()> {
        let source_name = join_name(parent_source, &attrs.source_name());
        let mut stored = if options.auto_template {
            auto_template(&String::from_utf8_lossy(&contents), &self.data).into_bytes()
        } else {
            contents.clone()
        };
        if options.encrypt {
            let encryptor = self
                .encryptor
                .as_ref()
                .ok_or_else(|| no_encryptor(&source_name))?;
            stored = encryptor.encrypt(&source_name, &stored)?;
        }
        self.write_source_file(&target_name, &source_name, &stored, mutator)?;

        let flags = FileFlags {
            empty: attrs.empty,
            encrypted: attrs.encrypted,
            perm: attrs.perm(),
            template: attrs.template,
        };
        let file = File::new(source_name, target_name, flags, contents)?;
        self.insert(file.into())
    }

    /// Write a source file, removing a previous source entry for the same
    /// target if its name differs.
    fn write_source_file(
        &mut self,
        target_name: &str,
        source_name: &str,
        contents: &[u8],
        mutator: &dyn Mutator,
    ) -> Result<()> {
        if let Some(existing) = self.entries.get(target_name)
            && existing.source_name() != source_name
        {
            mutator.remove_all(&self.source_dir.join(existing.source_name()))?;
        }
        self.forget(target_name);
        mutator.write_file(
            &self.source_dir.join(source_name),
            contents,
            0o666 & !self.umask,
        )?;
        Ok(())
    }
}

fn no_encryptor(name: &str) -> Error {
    Error::Encryption {
        name: name.to_string(),
        message: "no encryption tool configured".into(),
    }
}

fn is_private(perm: u32) -> bool {
    cfg!(unix) && perm & 0o077 == 0
}

fn join_name(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

/// Split a slash-separated name into its parent (if any) and last component.
fn split_last(name: &str) -> (Option<&str>, &str) {
    match name.rsplit_once('/') {
        Some((parent, base)) => (Some(parent), base),
        None => (None, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_and_join_names() {
        assert_eq!(split_last(".config/nvim/init.lua"), (Some(".config/nvim"), "init.lua"));
        assert_eq!(split_last(".bashrc"), (None, ".bashrc"));
        assert_eq!(join_name("", ".bashrc"), ".bashrc");
        assert_eq!(join_name(".config", "nvim"), ".config/nvim");
    }

    #[test]
    fn target_name_for_rejects_outside_and_root() {
        let state = TargetState::new("/src", "/home/u");
        assert_eq!(state.target_name_for(Path::new("/home/u/.bashrc")).unwrap(), ".bashrc");
        assert!(matches!(
            state.target_name_for(Path::new("/etc/passwd")),
            Err(Error::NotInDestDir { .. })
        ));
        assert!(state.target_name_for(Path::new("/home/u")).is_err());
    }

    #[test]
    fn ignore_is_relative_to_dest_dir() {
        let state = TargetState::new("/src", "/home/u")
            .with_ignore(|name: &str| name.ends_with(".swp"));
        assert!(state.is_ignored(Path::new("/home/u/notes.swp")));
        assert!(!state.is_ignored(Path::new("/home/u/notes")));
        assert!(!state.is_ignored(Path::new("/home/u")));
    }
}
