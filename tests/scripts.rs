use std::env as stdenv;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use argh::FromArgs;
use canopy::builtin::core_registry;
use canopy::config::{Config, Options};
use canopy::{
    CommandResult, CommandStatus, Context, ExecutionDirective, Interpreter, MemoryContext,
    MemoryScriptLocator,
};

fn make_unique_temp_dir() -> io::Result<PathBuf> {
    let mut p = stdenv::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    p.push(format!("canopy_it_{}_{}", std::process::id(), nanos));
    fs::create_dir_all(&p)?;
    Ok(p)
}

fn shell(scripts: MemoryScriptLocator) -> Interpreter {
    Interpreter::new(core_registry(), Box::new(scripts)).with_seed(3)
}

fn site() -> MemoryContext {
    let mut ctx = MemoryContext::new();
    ctx.add_item("/content", "folder").unwrap();
    ctx.add_item("/content/home", "page")
        .unwrap()
        .set_field("title", "Welcome home");
    ctx.add_item("/content/about", "page")
        .unwrap()
        .set_field("title", "About the company");
    ctx
}

#[test]
fn test_script_walks_items_with_conditions() {
    let source = "\
#^description: Reports pages whose title mentions the company
@echooff
split -ns -s , $1$ (rep 1 (if (@title ? company) (echo $current$)) /content/$current$)
";
    let mut sh = shell(MemoryScriptLocator::new().with_script("report", source));
    let mut ctx = site();
    let result = sh.execute(&mut ctx, "report home,about");
    assert_eq!(result.status(), CommandStatus::Success);
    assert_eq!(result.message(), "");
    assert_eq!(ctx.current_path(), "/");

    let result = sh.execute(&mut ctx, "rep 1 (if (@title ? company) (echo found)) /content/about");
    assert_eq!(result, CommandResult::success("found\n"));
}

#[test]
fn test_echoed_script_output_collects_every_line() {
    let source = "\
set greeting hello
echo $greeting$ $1$ -
  and more
add 1 < (add 1 1)
";
    let mut sh = shell(MemoryScriptLocator::new().with_script("hi", source));
    let result = sh.execute(&mut MemoryContext::new(), "hi (dear reader)");
    assert_eq!(
        result,
        CommandResult::success("hello\nhello dear reader and more\n3\n")
    );
}

#[test]
fn test_caller_directive_reaches_nested_scripts() {
    let scripts = MemoryScriptLocator::new()
        .with_script("outer", "inner\necho outer done")
        .with_script("inner", "nosuch\necho inner done");

    let mut sh = shell(scripts);
    let mut ctx = MemoryContext::new();

    let strict = sh.execute(&mut ctx, "outer");
    assert_eq!(strict.status(), CommandStatus::Failure);
    assert!(!strict.message().contains("done"));

    let relaxed = ExecutionDirective {
        ignore_unknown_commands: Some(true),
        ..ExecutionDirective::default()
    };
    let result = sh.execute_with(&mut ctx, "outer", &relaxed, None);
    assert_eq!(result.status(), CommandStatus::Success);
    assert!(result.message().contains("inner done"));
    assert!(result.message().ends_with("outer done\n"));
}

#[test]
fn test_exit_only_ends_the_innermost_script() {
    let scripts = MemoryScriptLocator::new()
        .with_script("outer", "inner\necho after inner")
        .with_script("inner", "exit leaving\necho unreachable");
    let mut sh = shell(scripts);
    let result = sh.execute(&mut MemoryContext::new(), "outer");
    assert_eq!(result, CommandResult::success("leaving\n\nafter inner\n"));
}

#[test]
fn test_chain_and_subcommand_together() {
    let mut sh = Interpreter::default();
    let mut ctx = MemoryContext::new();
    let result = sh.execute(&mut ctx, "add 1 < (multiply 2 3) > replace $~$ 7 seven");
    assert_eq!(result, CommandResult::success("seven"));
}

#[test]
fn test_file_scripts_through_config() -> io::Result<()> {
    let root = make_unique_temp_dir()?;
    fs::create_dir_all(root.join("nested"))?;
    fs::write(root.join("nested").join("greet.cnp"), "echo hello $1$\r\n")?;
    fs::write(
        root.join("init.cnp"),
        "set who world\nthis-command-does-not-exist",
    )?;

    let dir = root.display().to_string();
    let options = Options::from_args(&["canopy"], &["-s", dir.as_str(), "--seed", "1"]).unwrap();
    let mut sh = Config::from_options(options, None).build_interpreter();
    let mut ctx = MemoryContext::new();

    assert!(sh.init(&mut ctx).is_success());
    assert_eq!(ctx.env().get_var("who"), Some("world"));

    let result = sh.execute(&mut ctx, "greet $who$");
    assert_eq!(result, CommandResult::success("hello world\n"));

    let listing = sh.execute(&mut ctx, "ls-scripts");
    assert_eq!(listing, CommandResult::success("greet\ninit\n"));

    fs::remove_dir_all(&root)?;
    Ok(())
}
