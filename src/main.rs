mod cli;

use bdp_core::config::Config;
use bdp_core::language::expand_language_list;
use bdp_nav::{TitleFilter, ToolRegistry};
use bdp_pile::{Pile, Selection, TitleView};
use bdpile::chapters::{self, ChapterSpan};
use bdpile::disc::{describe, playlist_selections, Disc, PlaylistArg};
use bdpile::{ffargs, remux, report};

use anyhow::{bail, Result};
use clap::Parser;
use cli::{Cli, Commands, ExtractArgs, SourceArgs};
use std::io::Write;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "bdpile=debug,bdp_core=debug,bdp_pile=debug,bdp_nav=debug,bdp_pool=trace".to_string()
        } else {
            "bdpile=info,bdp_core=warn,bdp_pile=warn,bdp_nav=warn,bdp_pool=warn".to_string()
        }
    });

    // Logs go to stderr; stdout carries listings and ffmpeg commands.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load_or_default(cli.config.as_deref());
    for warning in config.validate() {
        tracing::warn!("{}", warning);
    }

    match cli.command {
        Commands::List {
            source,
            time,
            playlist,
            all,
            info,
            json,
        } => {
            let selections = if playlist.is_empty() {
                let mut sel = Selection::from_config(&config.selection);
                if let Selection::ByDuration { min_secs, filter } = &mut sel {
                    if let Some(t) = time {
                        *min_secs = t;
                    }
                    if all {
                        *filter = TitleFilter::All;
                    }
                }
                vec![sel]
            } else {
                playlist_selections(&playlist)
            };
            list_titles(&source, &selections, info, json, &config)
        }
        Commands::Chapters {
            source,
            playlist,
            format,
        } => {
            let (pile, spans) = open_single(&source, &playlist, &config)?;
            let mut out = std::io::stdout().lock();
            chapters::write_chapters(&mut out, format, &spans)?;
            pile.release();
            Ok(())
        }
        Commands::Ffmpeg(args) => print_ffmpeg(&args, &config),
        Commands::Remux(args) => run_remux(&args, &config),
        Commands::CheckTools => check_tools(&config),
    }
}

fn open_disc(source: &SourceArgs, config: &Config) -> Result<Disc> {
    Disc::open(&source.source, source.dump.as_deref(), source.ffprobe, config)
}

/// Build the one title `playlist` names, with its chapter spans.
fn open_single(
    source: &SourceArgs,
    playlist: &PlaylistArg,
    config: &Config,
) -> Result<(Pile, Vec<ChapterSpan>)> {
    let mut disc = open_disc(source, config)?;
    let pile = disc.build(&playlist.single(), config)?;
    let spans = disc.chapter_spans(single_title(&pile)?)?;
    Ok((pile, spans))
}

fn single_title(pile: &Pile) -> Result<TitleView<'_>> {
    match (pile.title(0), pile.title_count()) {
        (Some(title), 1) => Ok(title),
        (_, 0) => bail!("No title selected"),
        (_, n) => bail!("A single title is required ({n} selected)"),
    }
}

fn list_titles(
    source: &SourceArgs,
    selections: &[Selection],
    info: bool,
    json: bool,
    config: &Config,
) -> Result<()> {
    let pile = open_disc(source, config)?.build_all(selections, config)?;

    let mut out = std::io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut out, &pile)?;
        writeln!(out)?;
    } else if pile.is_empty() {
        eprintln!("No title selected ({})", describe(selections));
    } else {
        report::write_pile(&mut out, &pile, info)?;
    }
    pile.release();
    Ok(())
}

fn languages(args: &ExtractArgs, config: &Config) -> Result<Vec<bdp_core::LanguageCode>> {
    let list = args.languages.as_ref().unwrap_or(&config.remux.languages);
    Ok(expand_language_list(list)?)
}

fn print_ffmpeg(args: &ExtractArgs, config: &Config) -> Result<()> {
    let (pile, spans) = open_single(&args.source, &args.playlist, config)?;
    let title = single_title(&pile)?;
    let langs = languages(args, config)?;

    let with_chapters = !spans.is_empty();
    let argv = ffargs::ffmpeg_argv(
        title,
        &langs,
        &args.source.source,
        &args.output,
        with_chapters,
        &config.remux,
    );

    let mut out = std::io::stdout().lock();
    write!(out, "{}", ffargs::shell_line(&argv))?;
    if with_chapters {
        writeln!(out, " << EOF")?;
        chapters::write_ffmetadata(&mut out, &spans)?;
        writeln!(out, "EOF")?;
    } else {
        writeln!(out)?;
    }
    Ok(())
}

fn run_remux(args: &ExtractArgs, config: &Config) -> Result<()> {
    let tools = ToolRegistry::discover(&config.tools);
    let ffmpeg = tools.require("ffmpeg")?;

    let (pile, spans) = open_single(&args.source, &args.playlist, config)?;
    let title = single_title(&pile)?;
    let langs = languages(args, config)?;
    let cmd = remux::remux_command(
        ffmpeg,
        title,
        &spans,
        &langs,
        &args.source.source,
        &args.output,
        &config.remux,
    );

    println!(
        "Remuxing {:05}.mpls angle {} to {}",
        title.playlist,
        title.angle,
        args.output.display()
    );
    // Create tokio runtime
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(remux::run(&cmd))?;
    println!("Output: {}", args.output.display());
    Ok(())
}

fn check_tools(config: &Config) -> Result<()> {
    println!("Checking external tools...\n");

    let tools = ToolRegistry::discover(&config.tools).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable ffprobe and remux.");
    }

    Ok(())
}
