//! The position in the content tree that commands read and move.

use std::collections::BTreeMap;

use crate::env::Environment;
use crate::error::ContextError;

pub const DEFAULT_PARTITION: &str = "master";
pub const DEFAULT_LANGUAGE: &str = "en";
pub const ROOT_PATH: &str = "/";

/// Capability surface the interpreter needs from a content repository.
///
/// The dispatcher receives the context as an explicit `&mut dyn Context` on
/// every call; commands never hold on to it.
pub trait Context {
    /// Full path of the current item.
    fn current_path(&self) -> String;

    /// Moves to `path`, absolute or relative to the current item.
    fn set_current_path(&mut self, path: &str) -> Result<(), ContextError>;

    fn current_item_name(&self) -> String;

    fn partition(&self) -> String;

    fn set_partition(&mut self, name: &str) -> Result<(), ContextError>;

    fn language(&self) -> String;

    fn set_language(&mut self, language: &str);

    /// Selected version of the current item, if the item has versions.
    fn version(&self) -> Option<u32>;

    fn set_version(&mut self, version: Option<u32>);

    fn env(&self) -> &Environment;

    fn env_mut(&mut self) -> &mut Environment;

    /// Field value of the current item, `None` when it has no such field.
    fn field(&self, name: &str) -> Option<String>;

    /// Built-in attribute of the current item such as `name`, `id` or `path`.
    fn attribute(&self, name: &str) -> Option<String>;

    /// Saves the current position on a stack.
    fn push_context(&mut self);

    /// Restores the most recently saved position. Returns `false` if none was saved.
    fn pop_context(&mut self) -> bool;

    /// An independent copy, including variables and position.
    fn clone_context(&self) -> Box<dyn Context>;
}

/// Runs `f` with the context moved to `path`, restoring the position afterwards.
///
/// An empty or missing path runs `f` at the current position.
pub fn with_position<T>(
    ctx: &mut dyn Context,
    path: Option<&str>,
    f: impl FnOnce(&mut dyn Context) -> T,
) -> Result<T, ContextError> {
    ctx.push_context();
    if let Some(path) = path.filter(|p| !p.is_empty()) {
        if let Err(err) = ctx.set_current_path(path) {
            ctx.pop_context();
            return Err(err);
        }
    }
    let out = f(ctx);
    ctx.pop_context();
    Ok(out)
}

/// A node of the in-memory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub path: String,
    pub template: String,
    pub version: u32,
    pub fields: BTreeMap<String, String>,
}

impl Item {
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Position {
    partition: String,
    path: String,
    language: String,
    version: Option<u32>,
}

// Items of one partition keyed by lower-cased full path.
type Tree = BTreeMap<String, Item>;

/// A self-contained [`Context`] backed by in-memory trees.
///
/// Path lookups are case-insensitive. Every partition has a root item at `/`.
#[derive(Debug, Clone)]
pub struct MemoryContext {
    partitions: BTreeMap<String, Tree>,
    position: Position,
    stack: Vec<Position>,
    env: Environment,
    next_id: u64,
}

impl Default for MemoryContext {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryContext {
    pub fn new() -> Self {
        let mut ctx = Self {
            partitions: BTreeMap::new(),
            position: Position {
                partition: DEFAULT_PARTITION.to_string(),
                path: ROOT_PATH.to_string(),
                language: DEFAULT_LANGUAGE.to_string(),
                version: None,
            },
            stack: Vec::new(),
            env: Environment::new(),
            next_id: 0,
        };
        ctx.add_partition(DEFAULT_PARTITION);
        ctx
    }

    /// Creates an empty partition holding only a root item. Existing partitions are kept.
    pub fn add_partition(&mut self, name: &str) {
        if self.partitions.contains_key(name) {
            return;
        }
        let root = self.new_item(ROOT_PATH, "", "root");
        let mut tree = Tree::new();
        tree.insert(ROOT_PATH.to_string(), root);
        self.partitions.insert(name.to_string(), tree);
    }

    /// Adds an item to the current partition. The parent must already exist.
    pub fn add_item(&mut self, path: &str, template: &str) -> Result<&mut Item, ContextError> {
        let full = self.resolve(path);
        let (parent, name) = split_parent(&full);
        let partition = self.position.partition.clone();
        let exists = self
            .partitions
            .get(&partition)
            .is_some_and(|tree| tree.contains_key(&parent.to_lowercase()));
        if !exists {
            return Err(ContextError::ItemNotFound(parent.to_string()));
        }

        let item = self.new_item(&full, name, template);
        let tree = self
            .partitions
            .get_mut(&partition)
            .ok_or_else(|| ContextError::PartitionNotFound(partition.clone()))?;
        Ok(tree.entry(full.to_lowercase()).or_insert(item))
    }

    /// Normalizes `path` to an absolute path, resolving `.` and `..` segments.
    pub fn resolve(&self, path: &str) -> String {
        let mut segments: Vec<&str> = if path.starts_with('/') {
            Vec::new()
        } else {
            self.position.path.split('/').filter(|s| !s.is_empty()).collect()
        };
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            match segment {
                "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }
        format!("/{}", segments.join("/"))
    }

    fn new_item(&mut self, path: &str, name: &str, template: &str) -> Item {
        self.next_id += 1;
        Item {
            id: format!("{{{:08X}}}", self.next_id),
            name: name.to_string(),
            path: path.to_string(),
            template: template.to_string(),
            version: 1,
            fields: BTreeMap::new(),
        }
    }

    fn tree(&self) -> Option<&Tree> {
        self.partitions.get(&self.position.partition)
    }

    fn current_item(&self) -> Option<&Item> {
        self.tree()?.get(&self.position.path.to_lowercase())
    }
}

fn split_parent(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(0) => (ROOT_PATH, &path[1..]),
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => (ROOT_PATH, path),
    }
}

impl Context for MemoryContext {
    fn current_path(&self) -> String {
        self.current_item()
            .map(|item| item.path.clone())
            .unwrap_or_else(|| self.position.path.clone())
    }

    fn set_current_path(&mut self, path: &str) -> Result<(), ContextError> {
        let full = self.resolve(path);
        let found = self
            .tree()
            .and_then(|tree| tree.get(&full.to_lowercase()))
            .map(|item| item.path.clone());
        match found {
            Some(found) => {
                self.position.path = found;
                self.position.version = None;
                Ok(())
            }
            None => Err(ContextError::ItemNotFound(path.to_string())),
        }
    }

    fn current_item_name(&self) -> String {
        self.current_item()
            .map(|item| item.name.clone())
            .unwrap_or_default()
    }

    fn partition(&self) -> String {
        self.position.partition.clone()
    }

    fn set_partition(&mut self, name: &str) -> Result<(), ContextError> {
        let tree = self
            .partitions
            .get(name)
            .ok_or_else(|| ContextError::PartitionNotFound(name.to_string()))?;
        let keeps_path = tree.contains_key(&self.position.path.to_lowercase());
        self.position.partition = name.to_string();
        if !keeps_path {
            self.position.path = ROOT_PATH.to_string();
        }
        Ok(())
    }

    fn language(&self) -> String {
        self.position.language.clone()
    }

    fn set_language(&mut self, language: &str) {
        self.position.language = language.to_string();
    }

    fn version(&self) -> Option<u32> {
        self.position
            .version
            .or_else(|| self.current_item().map(|item| item.version))
    }

    fn set_version(&mut self, version: Option<u32>) {
        self.position.version = version;
    }

    fn env(&self) -> &Environment {
        &self.env
    }

    fn env_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    fn field(&self, name: &str) -> Option<String> {
        self.current_item()?.field(name).map(str::to_string)
    }

    fn attribute(&self, name: &str) -> Option<String> {
        let item = self.current_item()?;
        let value = match name.to_lowercase().as_str() {
            "id" => item.id.clone(),
            "name" => item.name.clone(),
            "key" => item.name.to_lowercase(),
            "path" => item.path.clone(),
            "template" => item.template.clone(),
            "version" => self.version().unwrap_or(item.version).to_string(),
            "language" => self.position.language.clone(),
            "database" => self.position.partition.clone(),
            _ => return None,
        };
        Some(value)
    }

    fn push_context(&mut self) {
        self.stack.push(self.position.clone());
    }

    fn pop_context(&mut self) -> bool {
        match self.stack.pop() {
            Some(position) => {
                self.position = position;
                true
            }
            None => false,
        }
    }

    fn clone_context(&self) -> Box<dyn Context> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemoryContext {
        let mut ctx = MemoryContext::new();
        ctx.add_item("/content", "folder").unwrap();
        ctx.add_item("/content/Home", "page")
            .unwrap()
            .set_field("title", "Welcome")
            .set_field("price", "42.5");
        ctx.add_item("/content/Home/About", "page").unwrap();
        ctx
    }

    #[test]
    fn test_relative_and_parent_navigation() {
        let mut ctx = sample();
        assert_eq!(ctx.current_path(), "/");
        ctx.set_current_path("content/home").unwrap();
        assert_eq!(ctx.current_path(), "/content/Home");
        ctx.set_current_path("./About").unwrap();
        assert_eq!(ctx.current_item_name(), "About");
        ctx.set_current_path("../..").unwrap();
        assert_eq!(ctx.current_path(), "/content");
    }

    #[test]
    fn test_unknown_path_keeps_position() {
        let mut ctx = sample();
        ctx.set_current_path("/content").unwrap();
        let err = ctx.set_current_path("missing").unwrap_err();
        assert_eq!(err, ContextError::ItemNotFound("missing".to_string()));
        assert_eq!(ctx.current_path(), "/content");
    }

    #[test]
    fn test_add_item_requires_parent() {
        let mut ctx = sample();
        assert!(ctx.add_item("/nowhere/child", "page").is_err());
    }

    #[test]
    fn test_fields_and_attributes() {
        let mut ctx = sample();
        ctx.set_current_path("/content/home").unwrap();
        assert_eq!(ctx.field("Title"), Some("Welcome".to_string()));
        assert_eq!(ctx.field("missing"), None);
        assert_eq!(ctx.attribute("name"), Some("Home".to_string()));
        assert_eq!(ctx.attribute("key"), Some("home".to_string()));
        assert_eq!(ctx.attribute("template"), Some("page".to_string()));
        assert_eq!(ctx.attribute("bogus"), None);
    }

    #[test]
    fn test_push_and_pop_restore_position() {
        let mut ctx = sample();
        ctx.push_context();
        ctx.set_current_path("/content/home/about").unwrap();
        ctx.set_language("de");
        assert!(ctx.pop_context());
        assert_eq!(ctx.current_path(), "/");
        assert_eq!(ctx.language(), "en");
        assert!(!ctx.pop_context());
    }

    #[test]
    fn test_with_position_restores_on_success_and_failure() {
        let mut ctx = sample();
        let name = with_position(&mut ctx, Some("/content/home"), |c| c.current_item_name()).unwrap();
        assert_eq!(name, "Home");
        assert_eq!(ctx.current_path(), "/");

        assert!(with_position(&mut ctx, Some("/missing"), |_| ()).is_err());
        assert_eq!(ctx.current_path(), "/");
        assert!(!ctx.pop_context());
    }

    #[test]
    fn test_partitions() {
        let mut ctx = sample();
        ctx.set_current_path("/content").unwrap();
        assert!(ctx.set_partition("web").is_err());
        ctx.add_partition("web");
        ctx.set_partition("web").unwrap();
        assert_eq!(ctx.partition(), "web");
        assert_eq!(ctx.current_path(), "/");
    }

    #[test]
    fn test_clone_is_independent() {
        let mut ctx = sample();
        let mut copy = ctx.clone_context();
        copy.env_mut().set_var("x", "1");
        copy.set_current_path("/content").unwrap();
        assert_eq!(ctx.env().get_var("x"), None);
        assert_eq!(ctx.current_path(), "/");
        ctx.env_mut().set_var("y", "2");
        assert_eq!(copy.env().get_var("y"), None);
    }
}
