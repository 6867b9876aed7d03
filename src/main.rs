use clap::{error::ErrorKind, Args, CommandFactory, Parser, Subcommand};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    sync::mpsc,
    time::{Duration, Instant},
};
use typecert::{
    app::{App, AppAction},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    controller::{TestSettings, TypingTest},
    level::Level,
    logging,
    paragraphs::ParagraphBank,
    profile::{FileProfileStore, Profile, ProfileInput},
    runtime::{AppEvent, CrosstermEventSource, FixedTicker, Runner},
    timer::TICK_INTERVAL,
    ui,
};

const REDRAW_INTERVAL_MS: u64 = 200;
// the countdown shows whole seconds, so redraw faster than that
const _: () = assert!(REDRAW_INTERVAL_MS < 1000);

/// timed typing test with local profiles and printable certificates
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A timed typing test that scores words per minute and accuracy against a reference paragraph, then issues a certificate. Profiles are stored on this device only."
)]
pub struct Cli {
    #[clap(subcommand)]
    command: Option<Command>,

    /// difficulty of the reference paragraph
    #[clap(short = 'l', long, value_enum)]
    level: Option<Level>,

    /// length of the test in seconds
    #[clap(short = 'd', long)]
    duration: Option<u64>,

    /// profile id (e.g. DKT-12345) whose name pre-fills the certificate
    #[clap(long)]
    id: Option<String>,

    /// name printed on the certificate
    #[clap(short = 'n', long)]
    name: Option<String>,

    /// JSON file with custom paragraphs per level
    #[clap(short = 'p', long)]
    paragraphs: Option<PathBuf>,

    /// keep config, profiles, results and certificates under this directory
    #[clap(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// manage profiles saved on this device
    #[clap(subcommand)]
    Profile(ProfileCommand),
}

#[derive(Args, Debug, Clone)]
struct ProfileFields {
    /// full name (required)
    #[clap(long)]
    name: String,
    #[clap(long, default_value = "")]
    email: String,
    #[clap(long, default_value = "")]
    country: String,
    #[clap(long, default_value = "")]
    dob: String,
    #[clap(long, default_value = "")]
    gender: String,
}

impl From<ProfileFields> for ProfileInput {
    fn from(f: ProfileFields) -> Self {
        Self {
            name: f.name,
            email: f.email,
            country: f.country,
            dob: f.dob,
            gender: f.gender,
        }
    }
}

#[derive(Subcommand, Debug, Clone)]
enum ProfileCommand {
    /// create a profile and print its new id
    Create(ProfileFields),
    /// replace the fields of an existing profile
    Update {
        id: String,
        #[clap(flatten)]
        fields: ProfileFields,
    },
    /// delete a profile
    Delete { id: String },
    /// show a profile (id is matched case-insensitively)
    Show { id: String },
    /// list profiles, newest first
    List,
    /// show the most recently created profile
    Last,
    /// write all profiles as JSON to a file or stdout
    Export { file: Option<PathBuf> },
    /// merge profiles from a JSON file, skipping ids already present
    Import { file: PathBuf },
    /// remove every saved profile
    Clear,
}

impl Cli {
    fn dirs(&self) -> AppDirs {
        match &self.data_dir {
            Some(dir) => AppDirs::rooted_at(dir),
            None => AppDirs::resolve(),
        }
    }

    /// CLI flags take precedence over the saved config
    fn merge_config(&self, mut cfg: Config) -> Config {
        if let Some(level) = self.level {
            cfg.level = level.to_string();
        }
        if let Some(duration) = self.duration {
            cfg.duration_secs = duration;
        }
        if let Some(name) = &self.name {
            cfg.name = Some(name.clone());
        }
        cfg
    }
}

fn print_profile(p: &Profile) {
    println!("{}  {}", p.id, p.name);
    for (label, value) in [
        ("email", &p.email),
        ("country", &p.country),
        ("dob", &p.dob),
        ("gender", &p.gender),
        ("created", &p.created_at),
        ("updated", &p.updated_at),
    ] {
        if !value.is_empty() {
            println!("  {label}: {value}");
        }
    }
}

fn run_profile_command(store: &FileProfileStore, cmd: ProfileCommand) -> Result<(), Box<dyn Error>> {
    match cmd {
        ProfileCommand::Create(fields) => {
            let profile = store.create(fields.into())?;
            println!("Profile created: {}", profile.id);
        }
        ProfileCommand::Update { id, fields } => {
            let profile = store.update(&id, fields.into())?;
            println!("Profile updated: {}", profile.id);
        }
        ProfileCommand::Delete { id } => {
            store.delete(&id)?;
            println!("Deleted {id}");
        }
        ProfileCommand::Show { id } => print_profile(&store.lookup(&id)?),
        ProfileCommand::List => {
            let profiles = store.list();
            if profiles.is_empty() {
                println!("No profiles saved yet.");
            }
            for p in &profiles {
                print_profile(p);
            }
        }
        ProfileCommand::Last => match store.last() {
            Some(p) => print_profile(&p),
            None => println!("No saved profiles yet"),
        },
        ProfileCommand::Export { file } => {
            let json = store.export_json()?;
            match file {
                Some(path) => {
                    std::fs::write(&path, json)?;
                    println!("Exported to {}", path.display());
                }
                None => println!("{json}"),
            }
        }
        ProfileCommand::Import { file } => {
            let raw = std::fs::read_to_string(file)?;
            let summary = store.import_json(&raw)?;
            println!(
                "Imported {} profiles ({} skipped)",
                summary.added, summary.skipped
            );
        }
        ProfileCommand::Clear => {
            store.clear_all()?;
            println!("All profiles removed");
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let dirs = cli.dirs();

    if let Err(e) = logging::init(&dirs.log_path()) {
        eprintln!("logging disabled: {e}");
    }

    if let Some(Command::Profile(cmd)) = cli.command.clone() {
        return run_profile_command(&FileProfileStore::new(&dirs), cmd);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let bank = match &cli.paragraphs {
        Some(path) => ParagraphBank::from_file(path)?,
        None => ParagraphBank::builtin()?,
    };

    let config_store = FileConfigStore::new(&dirs);
    let cfg = cli.merge_config(config_store.load());

    let (tx, rx) = mpsc::channel();
    let settings = TestSettings {
        level: cfg.level(),
        duration: cfg.duration(),
        tick_interval: TICK_INTERVAL,
    };
    let mut app = App::new(TypingTest::new(bank, settings, tx.clone()), dirs);
    if let Some(name) = &cfg.name {
        app.test.name_mut().set(name.clone());
    }
    if let Some(id) = &cli.id {
        app.apply_profile_id(id);
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(tx, rx),
        FixedTicker::new(Duration::from_millis(REDRAW_INTERVAL_MS)),
    );
    let outcome = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let saved = Config {
        level: app.test.level().to_string(),
        duration_secs: app.test.settings().duration.as_secs(),
        name: Some(app.test.name().value().to_string()).filter(|n| !n.trim().is_empty()),
    };
    if let Err(e) = config_store.save(&saved) {
        log::warn!("failed to save config: {e}");
    }

    outcome
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<CrosstermEventSource, FixedTicker>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        let Some(event) = runner.step() else {
            continue;
        };
        match event {
            AppEvent::Tick(id) => app.on_tick(id, Instant::now()),
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if app.on_key(key, Instant::now()) == AppAction::Quit {
                    break;
                }
            }
        }
    }
    Ok(())
}
