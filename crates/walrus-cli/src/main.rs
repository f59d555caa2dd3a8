use std::{
    env, fs,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::atomic::{AtomicUsize, Ordering},
    thread,
    time::Instant,
};

use walrus::{ConvertConfig, Converter, StderrTracer};

mod detect;
mod files;
mod options;

use options::{Command, Options, USAGE};

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let options = match Command::parse(&args, |key| env::var(key).ok()) {
        Ok(Command::Convert(options)) => options,
        Ok(Command::Help) => {
            println!("{USAGE}");
            return ExitCode::SUCCESS;
        }
        Ok(Command::Version) => {
            println!("walrus {}", env!("CARGO_PKG_VERSION"));
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("error: {err}\n\n{USAGE}");
            return ExitCode::FAILURE;
        }
    };

    let sources = match files::collect(&options.paths) {
        Ok(sources) if sources.is_empty() => {
            eprintln!("error: no valid source file found");
            return ExitCode::FAILURE;
        }
        Ok(sources) => sources,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let start = Instant::now();
    let failures = convert_all(&sources, &options);
    if !options.quiet {
        let elapsed = start.elapsed();
        eprintln!("converted {} of {} files in {elapsed:?}", sources.len() - failures.len(), sources.len());
    }
    if failures.is_empty() {
        ExitCode::SUCCESS
    } else {
        for (path, err) in &failures {
            eprintln!("error: {}: {err}", path.display());
        }
        ExitCode::FAILURE
    }
}

/// Converts every file on `options.jobs` threads. Returns the files that
/// failed, in input order.
fn convert_all(sources: &[PathBuf], options: &Options) -> Vec<(PathBuf, String)> {
    let next = AtomicUsize::new(0);
    let workers = options.jobs.get().min(sources.len());
    let mut failures: Vec<(usize, PathBuf, String)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|_| {
                scope.spawn(|| {
                    let mut failed = Vec::new();
                    loop {
                        let index = next.fetch_add(1, Ordering::Relaxed);
                        let Some(path) = sources.get(index) else {
                            break;
                        };
                        if let Err(err) = convert_file(path, options) {
                            failed.push((index, path.clone(), err));
                        }
                    }
                    failed
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| vec![(usize::MAX, PathBuf::new(), "worker thread panicked".to_owned())])
            })
            .collect()
    });
    failures.sort_by_key(|(index, ..)| *index);
    failures.into_iter().map(|(_, path, err)| (path, err)).collect()
}

fn convert_file(path: &Path, options: &Options) -> Result<(), String> {
    if !options.quiet {
        eprintln!("Now converting: {}", path.display());
    }
    let text = fs::read_to_string(path).map_err(|err| format!("cannot read file as UTF-8: {err}"))?;
    if let Some(root) = &options.archive {
        files::archive(path, root).map_err(|err| format!("cannot archive original: {err}"))?;
    }

    let config = ConvertConfig::new()
        .version(options.version)
        .linesep(options.linesep.unwrap_or_else(|| detect::linesep(&text)))
        .indentation(options.indentation.clone().unwrap_or_else(|| detect::indentation(&text)))
        .pep8(options.pep8);
    let converter = Converter::new(config);
    let result = if options.trace {
        converter.with_tracer(StderrTracer::new()).convert(&text)
    } else {
        let mut converter = converter;
        converter.convert(&text)
    };
    let converted = result.map_err(|err| err.to_string())?;

    if converted != text {
        fs::write(path, converted).map_err(|err| format!("cannot write converted file: {err}"))?;
    }
    Ok(())
}
