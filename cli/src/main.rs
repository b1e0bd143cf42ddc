mod test_runner;

use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use tracing::info;
use tracing_subscriber::EnvFilter;

use editor::{
    Editor, EditorConfig, EditorError, FsStore, SaveForm, SaveOutcome, TokenVerifier, Viewer,
};
use regions::{CommonMarkRenderer, apply_updates, render_authorized, render_public, renumber};

#[derive(Parser)]
#[command(name = "editable", version, about = "Editable region shortcode tools")]
struct Cli {
    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,

    /// More log output (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Site configuration file
    #[arg(long, global = true, default_value = "editable.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the regions of a markdown file
    Render(RenderArgs),

    /// Name unnamed regions `region-0`, `region-1`, ...
    Renumber(FileArgs),

    /// Replace region bodies in a markdown file
    Update(UpdateArgs),

    /// Report malformed or ambiguous region markers
    Check(CheckArgs),

    /// Show a site page as a viewer would get it
    View(ViewArgs),

    /// Post a form-encoded save to a site page
    Save(SaveArgs),

    /// Print the editor.js payload for a site route
    Script(RouteArgs),

    /// Run .test.md fixture files
    Test(TestArgs),
}

#[derive(clap::Args)]
struct FileArgs {
    /// Markdown file
    file: String,

    /// Write the result back instead of printing it
    #[arg(short, long)]
    write: bool,
}

#[derive(clap::Args)]
struct RenderArgs {
    /// Markdown file
    file: String,

    /// Render as an editor would see it: renumbered, with envelopes
    #[arg(short, long)]
    authorized: bool,
}

#[derive(clap::Args)]
struct UpdateArgs {
    #[command(flatten)]
    target: FileArgs,

    /// Region update as NAME=BODY. Repeatable; applied in order.
    #[arg(short, long = "set", value_parser = parse_update, required = true)]
    updates: Vec<(String, String)>,
}

#[derive(clap::Args)]
struct CheckArgs {
    /// Markdown files to check
    #[arg(required = true)]
    files: Vec<String>,
}

#[derive(clap::Args)]
struct RouteArgs {
    /// Page route, e.g. /blog/post
    route: String,
}

#[derive(clap::Args)]
struct ViewArgs {
    #[command(flatten)]
    target: RouteArgs,

    /// View with editing rights
    #[arg(short, long)]
    editor: bool,
}

#[derive(clap::Args)]
struct SaveArgs {
    #[command(flatten)]
    target: RouteArgs,

    /// Form-encoded body, e.g. `ct-nonce=...&region-0=Hello`
    #[arg(short, long)]
    form: String,

    /// Add a freshly issued token to the form
    #[arg(long)]
    sign: bool,
}

#[derive(clap::Args)]
struct TestArgs {
    /// Path to a .test.md file or directory containing them
    path: String,

    /// Run only tests in these categories (subfolder names). Repeatable.
    #[arg(short, long)]
    category: Vec<String>,

    /// List available categories and exit
    #[arg(long)]
    list_categories: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let code = match cli.command {
        Command::Render(args) => do_render(args),
        Command::Renumber(args) => do_renumber(args),
        Command::Update(args) => do_update(args),
        Command::Check(args) => do_check(args, cli.no_color),
        Command::View(args) => site_command(&cli.config, |editor| do_view(editor, args)),
        Command::Save(args) => site_command(&cli.config, |editor| do_save(editor, args)),
        Command::Script(args) => site_command(&cli.config, |editor| do_script(editor, args)),
        Command::Test(args) => {
            let path = Path::new(&args.path);
            if args.list_categories {
                test_runner::list_categories(path);
                return;
            }
            test_runner::run_tests(path, cli.no_color, &args.category)
        }
    };
    process::exit(code);
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn read_source(file: &str) -> Result<String, i32> {
    std::fs::read_to_string(file).map_err(|e| {
        eprintln!("error: cannot read '{}': {}", file, e);
        1
    })
}

fn write_or_print(args: &FileArgs, document: &str) -> i32 {
    if !args.write {
        print!("{}", document);
        return 0;
    }
    match std::fs::write(&args.file, document) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("error: cannot write '{}': {}", args.file, e);
            1
        }
    }
}

fn do_render(args: RenderArgs) -> i32 {
    let source = match read_source(&args.file) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let renderer = CommonMarkRenderer::default();
    let output = if args.authorized {
        render_authorized(&renumber(&source).document, &renderer)
    } else {
        render_public(&source, &renderer)
    };
    print!("{}", output);
    0
}

fn do_renumber(args: FileArgs) -> i32 {
    let source = match read_source(&args.file) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let result = renumber(&source);
    if result.changed {
        eprintln!("renumbered {} region(s)", result.count);
    } else {
        eprintln!("ok: {} region(s) already numbered", result.count);
        if args.write {
            return 0;
        }
    }
    write_or_print(&args, &result.document)
}

fn do_update(args: UpdateArgs) -> i32 {
    let source = match read_source(&args.target.file) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let result = apply_updates(&source, args.updates.iter().map(|(name, body)| (name, body)));
    for name in &result.skipped {
        eprintln!("warning: no region named '{}'", name);
    }
    write_or_print(&args.target, &result.document)
}

fn parse_update(arg: &str) -> Result<(String, String), String> {
    arg.split_once('=')
        .map(|(name, body)| (name.to_string(), body.replace("\\n", "\n")))
        .ok_or_else(|| format!("expected NAME=BODY, got '{}'", arg))
}

fn do_check(args: CheckArgs, no_color: bool) -> i32 {
    let color_choice = if no_color {
        ColorChoice::Never
    } else {
        ColorChoice::Auto
    };
    let writer = StandardStream::stderr(color_choice);
    let config = term::Config::default();

    let mut files = SimpleFiles::new();
    let mut errors = 0usize;
    let mut code = 0;

    for file in &args.files {
        let source = match read_source(file) {
            Ok(s) => s,
            Err(c) => {
                code = c;
                continue;
            }
        };
        let file_id = files.add(file.clone(), source.clone());
        let diagnostics = regions::lint::check(&source, file_id);
        for diagnostic in &diagnostics {
            let _ = term::emit_to_write_style(
                &mut writer.lock(),
                &config,
                &files,
                &diagnostic.to_diagnostic(),
            );
        }
        errors += diagnostics.iter().filter(|d| d.is_error()).count();
    }

    if errors > 0 {
        eprintln!("error: {} problem(s) would misdirect saved changes", errors);
        return 1;
    }
    code
}

fn site_command<F>(config_path: &Path, run: F) -> i32
where
    F: FnOnce(&mut Editor<FsStore>) -> Result<i32, EditorError>,
{
    let result = EditorConfig::load_or_default(config_path).and_then(|config| {
        let store = FsStore::new(&config.pages_dir);
        let mut editor = Editor::new(config, store)?;
        run(&mut editor)
    });
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            1
        }
    }
}

/// Session id of the local operator; tokens from `--sign` and `script` are
/// bound to it.
const CLI_SESSION: &str = "cli";

fn operator() -> Viewer {
    Viewer::user(CLI_SESSION, ["admin.pages"])
}

fn do_view(editor: &mut Editor<FsStore>, args: ViewArgs) -> Result<i32, EditorError> {
    let viewer = if args.editor {
        operator()
    } else {
        Viewer::anonymous()
    };
    let view = editor.view(&args.target.route, &viewer)?;
    if view.renumbered {
        info!(route = %args.target.route, "page saved with new region names");
    }
    for asset in &view.assets {
        eprintln!("asset: {}", asset);
    }
    print!("{}", view.content);
    Ok(0)
}

fn do_save(editor: &mut Editor<FsStore>, args: SaveArgs) -> Result<i32, EditorError> {
    let field = editor.config().nonce_field.clone();
    let mut form = SaveForm::parse(&args.form, &field);
    if args.sign {
        form.token = Some(editor.tokens().issue(CLI_SESSION));
    }
    match editor.save(&args.target.route, &form, &operator())? {
        SaveOutcome::Applied { regions, skipped } => {
            eprintln!("saved: {}", regions.join(", "));
            for name in skipped {
                eprintln!("warning: no region named '{}'", name);
            }
            Ok(0)
        }
        SaveOutcome::NoOp { skipped } => {
            eprintln!("nothing saved: no region named {}", skipped.join(", "));
            Ok(0)
        }
        SaveOutcome::Rejected => {
            eprintln!("error: save rejected, the token did not verify");
            Ok(1)
        }
    }
}

fn do_script(editor: &mut Editor<FsStore>, args: RouteArgs) -> Result<i32, EditorError> {
    let token = editor.tokens().issue(CLI_SESSION);
    print!("{}", editor.editor_script(&args.route, &token)?);
    Ok(0)
}
