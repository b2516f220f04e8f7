//! `ehr-notes`: command-line front end for portable patient visit files.

mod args;
mod prompt;

use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use ehr_notes_core::{
    DownloadTarget, FixedPathPicker, IdGenerator, PickerTarget, RecordOutcome, Session, VisitForm,
};

use args::{Cli, Command, RecordArgs};
use prompt::PromptPicker;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let stdout = io::stdout();
    run(cli, &mut stdout.lock())
}

fn run<W: Write>(cli: Cli, out: &mut W) -> Result<()> {
    let ids = cli.id_strategy.generator();
    log::debug!("using {} identifiers", ids.strategy());

    match cli.command {
        Command::Record(args) => record(args, ids, out),
        Command::History { file } => history(&file, ids, out),
        Command::Id { count } => {
            for _ in 0..count {
                writeln!(out, "{}", ids.generate())?;
            }
            Ok(())
        }
    }
}

fn record<W: Write>(args: RecordArgs, ids: IdGenerator, out: &mut W) -> Result<()> {
    let mut session = Session::with_ids(ids);
    let mut form = VisitForm::default();

    if let Some(file) = &args.file {
        let record = session
            .load_file(file)
            .with_context(|| format!("Could not load patient file {}", file.display()))?;
        form.fill_from(record);
    }
    args.apply_to(&mut form);

    let download_dir = args
        .download_dir
        .clone()
        .unwrap_or_else(DownloadTarget::default_dir);

    let outcome = if let Some(output) = &args.output {
        let mut target = PickerTarget::new(FixedPathPicker::new(output));
        session.record_visit(&mut form, &mut target)?
    } else if args.interactive {
        let picker = PromptPicker::new(io::stdin().lock(), io::stderr(), download_dir);
        session.record_visit(&mut form, &mut PickerTarget::new(picker))?
    } else {
        session.record_visit(&mut form, &mut DownloadTarget::new(download_dir))?
    };

    match outcome {
        RecordOutcome::Saved { location, .. } => {
            writeln!(out, "Visit saved to {}", location.display())?;
            writeln!(out)?;
            writeln!(out, "{}", session.history())?;
        }
        RecordOutcome::Cancelled => {
            writeln!(out, "Save cancelled; nothing was written.")?;
        }
    }
    Ok(())
}

fn history<W: Write>(file: &Path, ids: IdGenerator, out: &mut W) -> Result<()> {
    let mut session = Session::with_ids(ids);
    let record = session
        .load_file(file)
        .with_context(|| format!("Could not load patient file {}", file.display()))?;

    writeln!(
        out,
        "{} ({}, born {})",
        record.display_name(),
        record.personal_id,
        record.birthdate
    )?;
    writeln!(out)?;

    let text = session.history();
    if text.is_empty() {
        writeln!(out, "(no visits)")?;
    } else {
        writeln!(out, "{}", text)?;
    }
    Ok(())
}
