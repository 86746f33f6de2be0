use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use dsp_core::{CastMode, EncodeOptions, GameSave};
use dsp_render::{render_json, render_layout, render_text, vein_summary, vein_summary_json};

const SAVE_SUBDIR: &str = "Dyson Sphere Program/Save";
const LAST_EXIT_SAVE: &str = "_lastexit_.dsv";

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Save file; defaults to the game's last-exit autosave.
    #[arg(value_name = "SAVE.dsv")]
    path: Option<PathBuf>,
    #[arg(long, conflicts_with = "layout")]
    json: bool,
    #[arg(long, conflicts_with = "veins")]
    layout: bool,
    #[arg(long)]
    veins: bool,
    #[arg(short, long)]
    verbose: bool,
    #[arg(long = "set-user-name")]
    set_user_name: Option<String>,
    #[arg(long = "set-game-name")]
    set_game_name: Option<String>,
    #[arg(long = "set-sand", allow_hyphen_values = true)]
    set_sand: Option<i64>,
    /// Mask out-of-range integers to their field width instead of failing.
    #[arg(long = "wrapping-casts", requires = "output")]
    wrapping_casts: bool,
    /// Refuse to write when a list length differs from its count field.
    #[arg(long = "strict-counts", requires = "output")]
    strict_counts: bool,
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Cli {
    fn has_edits(&self) -> bool {
        self.set_user_name.is_some() || self.set_game_name.is_some() || self.set_sand.is_some()
    }

    fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            cast: if self.wrapping_casts {
                CastMode::Wrapping
            } else {
                CastMode::Checked
            },
            strict_counts: self.strict_counts,
        }
    }
}

fn default_save_path() -> Option<PathBuf> {
    dirs::document_dir().map(|docs| docs.join(SAVE_SUBDIR).join(LAST_EXIT_SAVE))
}

fn main() {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let has_edits = cli.has_edits();
    if has_edits && cli.output.is_none() {
        eprintln!("--set-* flags require --output <PATH>");
        process::exit(2);
    }
    if !has_edits && cli.output.is_some() {
        eprintln!("--output requires at least one --set-* flag");
        process::exit(2);
    }

    let path = match cli.path.clone().or_else(default_save_path) {
        Some(path) => path,
        None => {
            eprintln!("No save path given and no documents directory found");
            process::exit(2);
        }
    };
    log::debug!("reading {}", path.display());

    let bytes = fs::read(&path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", path.display());
        process::exit(1);
    });
    let mut save = GameSave::from_bytes(&bytes).unwrap_or_else(|e| {
        eprintln!("Error parsing save file: {}", path.display());
        eprintln!("  {}", e);
        process::exit(1);
    });

    if let Some(name) = &cli.set_user_name {
        save.set_user_name(name.as_str()).unwrap_or_else(|e| {
            eprintln!("Error applying user name edit: {e}");
            process::exit(1);
        });
    }
    if let Some(name) = &cli.set_game_name {
        save.set_game_name(name.as_str()).unwrap_or_else(|e| {
            eprintln!("Error applying game name edit: {e}");
            process::exit(1);
        });
    }
    if let Some(sand) = cli.set_sand {
        save.set_sand_count(sand).unwrap_or_else(|e| {
            eprintln!("Error applying sand edit: {e}");
            process::exit(1);
        });
    }

    if let Some(out_path) = &cli.output {
        save.recompute_file_length().unwrap_or_else(|e| {
            eprintln!("Error computing file length: {e}");
            process::exit(1);
        });
        let edited_bytes = save.to_bytes_with(&cli.encode_options()).unwrap_or_else(|e| {
            eprintln!("Error creating modified save bytes: {e}");
            process::exit(1);
        });
        fs::write(out_path, edited_bytes).unwrap_or_else(|e| {
            eprintln!("Error writing {}: {e}", out_path.display());
            process::exit(1);
        });
    }

    if cli.json {
        let json = if cli.veins {
            vein_summary_json(&save).unwrap_or_else(|e| {
                eprintln!("Error summarizing veins: {e}");
                process::exit(1);
            })
        } else {
            render_json(&save)
        };
        let rendered = serde_json::to_string_pretty(&json).unwrap_or_else(|e| {
            eprintln!("Error rendering JSON output: {e}");
            process::exit(1);
        });
        println!("{rendered}");
        return;
    }

    if cli.layout {
        print!("{}", render_layout(&save));
        return;
    }

    if cli.veins {
        let summary = vein_summary(&save).unwrap_or_else(|e| {
            eprintln!("Error summarizing veins: {e}");
            process::exit(1);
        });
        print!("{summary}");
        return;
    }

    if let Some(out_path) = &cli.output {
        println!("Wrote edited save to {}", out_path.display());
        return;
    }

    print!("{}", render_text(&save));
}
