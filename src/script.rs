//! Where script sources come from.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::constants::COMMENT_INDICATOR;
use crate::error::ScriptError;
use crate::help::HelpDetails;
use crate::lexer::parse_script_lines;

/// Marks a comment line as a help entry: `#^key: value`.
pub const HELP_COMMENT_SYMBOL: &str = "^";
const HELP_COMMENT_DELIMITER: char = ':';

/// Resolves script names to their source text.
pub trait ScriptLocator {
    /// `Ok(None)` when no script has this name.
    fn get_script(&self, name: &str) -> Result<Option<String>, ScriptError>;

    /// Help assembled from the `#^key: value` comments of the script.
    fn get_script_help(&self, name: &str) -> Result<Option<HelpDetails>, ScriptError> {
        Ok(self.get_script(name)?.map(|source| extract_help(&source)))
    }

    /// All script names this locator knows about, sorted.
    fn script_names(&self) -> Vec<String>;

    /// Human readable location of a script, used to list ambiguous matches.
    fn origin(&self, name: &str) -> String {
        name.to_string()
    }
}

/// Builds a help record from the help comments of a script.
///
/// Recognised keys are `description`, `usage`, `comments`, `example` and
/// `parameter` (whose value is itself `name: text`).
pub fn extract_help(source: &str) -> HelpDetails {
    let prefix = format!("{}{}", COMMENT_INDICATOR, HELP_COMMENT_SYMBOL);
    let mut details = HelpDetails::default();

    for line in parse_script_lines(source) {
        let Some(entry) = line.trim_start().strip_prefix(prefix.as_str()) else {
            continue;
        };
        let Some((key, value)) = entry.split_once(HELP_COMMENT_DELIMITER) else {
            continue;
        };
        let value = value.trim();
        match key.trim().to_lowercase().as_str() {
            "description" => details.description.push_str(value),
            "usage" => details.usage = value.to_string(),
            "comments" => details.comments.push_str(value),
            "example" => details.add_example(value),
            "parameter" => {
                if let Some((name, text)) = value.split_once(HELP_COMMENT_DELIMITER) {
                    details.add_parameter(name.trim(), text.trim());
                }
            }
            _ => {}
        }
    }
    details
}

/// Scripts held in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct MemoryScriptLocator {
    scripts: BTreeMap<String, String>,
}

impl MemoryScriptLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.add(name, source);
        self
    }

    pub fn add(&mut self, name: impl Into<String>, source: impl Into<String>) {
        self.scripts.insert(name.into(), source.into());
    }
}

impl ScriptLocator for MemoryScriptLocator {
    fn get_script(&self, name: &str) -> Result<Option<String>, ScriptError> {
        Ok(self.scripts.get(name).cloned())
    }

    fn script_names(&self) -> Vec<String> {
        self.scripts.keys().cloned().collect()
    }

    fn origin(&self, name: &str) -> String {
        format!("memory:{}", name)
    }
}

/// Scripts stored as `<name>.<extension>` files anywhere below a directory.
#[derive(Debug, Clone)]
pub struct FileScriptLocator {
    root: PathBuf,
    extension: String,
}

impl FileScriptLocator {
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into().trim_start_matches('.').to_string(),
        }
    }

    fn find_script_files(&self, name: &str) -> io::Result<Vec<PathBuf>> {
        let relative = name.trim_start_matches(['/', '\\']);
        let full = self.root.join(relative).with_extension(&self.extension);
        let (Some(dir), Some(file_name)) = (full.parent(), full.file_name()) else {
            return Ok(Vec::new());
        };
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut found = Vec::new();
        walk(dir, &mut |path| {
            if path.file_name() == Some(file_name) {
                found.push(path.to_path_buf());
            }
        })?;
        found.sort();
        Ok(found)
    }
}

fn walk(dir: &Path, visit: &mut dyn FnMut(&Path)) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            walk(&path, visit)?;
        } else {
            visit(&path);
        }
    }
    Ok(())
}

impl ScriptLocator for FileScriptLocator {
    fn get_script(&self, name: &str) -> Result<Option<String>, ScriptError> {
        let io_error = |source| ScriptError::Io {
            name: name.to_string(),
            source,
        };
        let files = self.find_script_files(name).map_err(io_error)?;
        match files.as_slice() {
            [] => Ok(None),
            [file] => fs::read_to_string(file).map(Some).map_err(io_error),
            _ => Err(ScriptError::MultipleScriptsFound {
                names: files.iter().map(|f| f.display().to_string()).collect(),
            }),
        }
    }

    fn script_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        let extension = self.extension.as_str();
        let result = walk(&self.root, &mut |path| {
            if path.extension().is_some_and(|ext| ext == extension) {
                if let Some(stem) = path.file_stem() {
                    names.push(stem.to_string_lossy().into_owned());
                }
            }
        });
        if let Err(err) = result {
            warn!(root = %self.root.display(), %err, "failed to list scripts");
        }
        names.sort();
        names
    }

    fn origin(&self, name: &str) -> String {
        self.root
            .join(name)
            .with_extension(&self.extension)
            .display()
            .to_string()
    }
}

/// Searches several locators; a name found in more than one is ambiguous.
#[derive(Default)]
pub struct CompositeScriptLocator {
    locators: Vec<Box<dyn ScriptLocator>>,
}

impl CompositeScriptLocator {
    pub fn new(locators: Vec<Box<dyn ScriptLocator>>) -> Self {
        Self { locators }
    }

    pub fn push(&mut self, locator: Box<dyn ScriptLocator>) {
        self.locators.push(locator);
    }
}

impl ScriptLocator for CompositeScriptLocator {
    fn get_script(&self, name: &str) -> Result<Option<String>, ScriptError> {
        let mut found = Vec::new();
        for locator in &self.locators {
            if let Some(source) = locator.get_script(name)? {
                found.push((locator.origin(name), source));
            }
        }
        if found.len() > 1 {
            return Err(ScriptError::MultipleScriptsFound {
                names: found.into_iter().map(|(origin, _)| origin).collect(),
            });
        }
        Ok(found.pop().map(|(_, source)| source.replace("\r\n", "\n")))
    }

    fn script_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .locators
            .iter()
            .flat_map(|locator| locator.script_names())
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env as stdenv;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn make_unique_temp_dir() -> io::Result<PathBuf> {
        let mut p = stdenv::temp_dir();
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        p.push(format!("canopy_scripts_{}_{}", std::process::id(), nanos));
        fs::create_dir_all(&p)?;
        Ok(p)
    }

    #[test]
    fn test_extract_help_from_comments() {
        let source = "#^description: Creates things\n\
                      #^usage: make name\n\
                      #^parameter: name: What to call it\n\
                      #^example: make thing\n\
                      # plain comment\n\
                      echo $1$";
        let help = extract_help(source);
        assert_eq!(help.description, "Creates things");
        assert_eq!(help.usage, "make name");
        assert_eq!(
            help.parameters,
            vec![("name".to_string(), "What to call it".to_string())]
        );
        assert_eq!(help.examples, vec!["make thing"]);
    }

    #[test]
    fn test_memory_locator() {
        let locator = MemoryScriptLocator::new()
            .with_script("b", "echo b")
            .with_script("a", "#^description: A\necho a");
        assert_eq!(locator.get_script("b").unwrap().as_deref(), Some("echo b"));
        assert!(locator.get_script("c").unwrap().is_none());
        assert_eq!(locator.script_names(), vec!["a", "b"]);
        assert_eq!(
            locator.get_script_help("a").unwrap().unwrap().description,
            "A"
        );
    }

    #[test]
    fn test_composite_reports_every_colliding_origin() {
        let composite = CompositeScriptLocator::new(vec![
            Box::new(MemoryScriptLocator::new().with_script("dup", "echo 1")),
            Box::new(MemoryScriptLocator::new().with_script("dup", "echo 2").with_script("solo", "echo 3\r\n")),
        ]);
        match composite.get_script("dup") {
            Err(ScriptError::MultipleScriptsFound { names }) => {
                assert_eq!(names, vec!["memory:dup", "memory:dup"]);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(composite.get_script("solo").unwrap().as_deref(), Some("echo 3\n"));
        assert_eq!(composite.script_names(), vec!["dup", "dup", "solo"]);
    }

    #[test]
    fn test_file_locator_finds_nested_scripts() -> io::Result<()> {
        let root = make_unique_temp_dir()?;
        fs::create_dir_all(root.join("tools"))?;
        fs::write(root.join("hello.cnp"), "echo hello")?;
        fs::write(root.join("tools").join("deploy.cnp"), "echo deploy")?;
        fs::write(root.join("notes.txt"), "not a script")?;

        let locator = FileScriptLocator::new(&root, "cnp");
        assert_eq!(locator.get_script("/hello").unwrap().as_deref(), Some("echo hello"));
        assert_eq!(locator.get_script("deploy").unwrap().as_deref(), Some("echo deploy"));
        assert!(locator.get_script("notes").unwrap().is_none());
        assert_eq!(locator.script_names(), vec!["deploy", "hello"]);

        fs::create_dir_all(root.join("more"))?;
        fs::write(root.join("more").join("deploy.cnp"), "echo again")?;
        assert!(matches!(
            locator.get_script("deploy"),
            Err(ScriptError::MultipleScriptsFound { ref names }) if names.len() == 2
        ));

        fs::remove_dir_all(&root)?;
        Ok(())
    }
}
