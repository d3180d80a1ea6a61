// Copyright 2025 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::Context;
use pico_args::Arguments;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sedml_compat::CopasiBackend;
use sedml_engine::Converter;

const EXIT_SUCCESS: i32 = 0;
const EXIT_FAILURE: i32 = 1;
const DEFAULT_LOG_FILTER: &str = "warn";

fn usage() -> String {
    let argv0 = std::env::args()
        .next()
        .unwrap_or_else(|| "copasi2sedml".to_string());
    format!(
        concat!(
            "This program converts a copasi time course task to SED-ML\n",
            "\n",
            "USAGE:\n",
            "    {} -f FILE -o OUT\n",
            "\n",
            "OPTIONS:\n",
            "    -f, --file FILE  COPASI model file to convert\n",
            "    -o, --out OUT    SED-ML file to write; a .sedx extension writes an archive\n",
            "    -h, /?, --help   show this message\n",
        ),
        argv0
    )
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Args {
    file: PathBuf,
    out: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum ParseOutcome {
    Help,
    Run(Args),
    Invalid(String),
}

fn parse_args(args: Vec<OsString>) -> ParseOutcome {
    if args.iter().any(|arg| arg == "/?") {
        return ParseOutcome::Help;
    }

    let mut parsed = Arguments::from_vec(args);
    if parsed.contains(["-h", "--help"]) {
        return ParseOutcome::Help;
    }

    let file: Option<PathBuf> = match parsed.opt_value_from_str(["-f", "--file"]) {
        Ok(file) => file,
        Err(err) => return ParseOutcome::Invalid(err.to_string()),
    };
    let out: Option<PathBuf> = match parsed.opt_value_from_str(["-o", "--out"]) {
        Ok(out) => out,
        Err(err) => return ParseOutcome::Invalid(err.to_string()),
    };

    let rest = parsed.finish();
    if let Some(arg) = rest.first() {
        return ParseOutcome::Invalid(format!("unexpected argument {}", arg.to_string_lossy()));
    }

    let Some(file) = file else {
        return ParseOutcome::Invalid("model file (-f) required".to_owned());
    };
    let Some(out) = out else {
        return ParseOutcome::Invalid("output file (-o) required".to_owned());
    };
    if !file.is_file() {
        return ParseOutcome::Invalid(format!("model file {} does not exist", file.display()));
    }

    ParseOutcome::Run(Args { file, out })
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> anyhow::Result<()> {
    let mut converter = Converter::new(CopasiBackend, args.file.clone());
    converter.save_to(&args.out).with_context(|| {
        format!(
            "converting {} to {}",
            args.file.display(),
            args.out.display()
        )
    })?;
    info!(out = %args.out.display(), "conversion finished");
    Ok(())
}

fn main() {
    init_logging();

    let code = match parse_args(std::env::args_os().skip(1).collect()) {
        ParseOutcome::Help => {
            print!("{}", usage());
            EXIT_SUCCESS
        }
        ParseOutcome::Invalid(reason) => {
            eprintln!("error: {reason}\n");
            eprint!("{}", usage());
            EXIT_FAILURE
        }
        ParseOutcome::Run(args) => match run(&args) {
            Ok(()) => EXIT_SUCCESS,
            Err(err) => {
                eprintln!("error: {err:#}");
                EXIT_FAILURE
            }
        },
    };

    std::process::exit(code);
}
