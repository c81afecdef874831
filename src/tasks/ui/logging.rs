/* ********************************************************************** **
**  This file is part of mlpot.                                           **
**                                                                        **
**  mlpot is free software: you can redistribute it and/or modify it      **
**  under the terms of the GNU General Public License as published by     **
**  the Free Software Foundation, either version 3 of the License, or     **
**  (at your option) any later version.                                   **
**                                                                        **
**      http://www.gnu.org/licenses/                                      **
**                                                                        **
** Do note that, while the whole of mlpot is licensed under the GPL, many **
** parts of it are licensed under more permissive terms.                  **
** ********************************************************************** */

//! Global logger: colorized lines on stdout, plain lines in an optional log file.
//!
//! The log file is usually only known after argument parsing (it lives in the
//! output directory), so everything logged before it is attached is buffered
//! and replayed into it.

use crate::FailResult;

use log::{Level, LevelFilter, Log, Metadata, Record};
use mlpot_fs_util as fsx;
use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use std::time::Instant;

/// Overrides the log level of every crate (`error`, `warn`, `info`, `debug`, `trace`).
pub const LOG_ENV_VAR: &str = "MLPOT_LOG";

const MLPOT_CRATES: &[&str] = &[
    "mlpot",
    "mlpot_tasks",
    "mlpot_tasks_config",
    "mlpot_structure",
    "mlpot_kernel",
    "mlpot_linalg",
    "mlpot_fit",
    "mlpot_outcar_io",
    "mlpot_fs_util",
];

lazy_static! {
    static ref GLOBAL_LOGFILE: Mutex<Logfile> = Mutex::new(Logfile::Buffering(vec![]));
}

enum Logfile {
    /// Lines logged before a file was attached.
    Buffering(Vec<String>),
    Writing(BufWriter<File>),
    Discarding,
}

impl Logfile {
    fn write_line(&mut self, line: String) {
        match self {
            Logfile::Buffering(lines) => lines.push(line),
            Logfile::Writing(file) => {
                // errors writing the log are dropped; there is nowhere to report them
                let _ = writeln!(file, "{}", line).and_then(|()| file.flush());
            },
            Logfile::Discarding => {},
        }
    }

    fn attach(&mut self, file: File) -> io::Result<()> {
        let mut file = BufWriter::new(file);
        if let Logfile::Buffering(lines) = self {
            for line in lines.iter() {
                writeln!(file, "{}", line)?;
            }
        }
        file.flush()?;
        *self = Logfile::Writing(file);
        Ok(())
    }
}

// forwards formatted records to GLOBAL_LOGFILE
struct LogfileSink;

impl Log for LogfileSink {
    fn enabled(&self, _: &Metadata<'_>) -> bool { true }

    fn log(&self, record: &Record<'_>) {
        if let Ok(mut logfile) = GLOBAL_LOGFILE.lock() {
            logfile.write_line(record.args().to_string());
        }
    }

    fn flush(&self) {}
}

/// Token returned by [`init_global_logger`], used to decide where the log file goes.
#[must_use = "the log buffer grows until the log file is started or disabled"]
#[derive(Debug)]
pub struct SetGlobalLogfile(());

impl SetGlobalLogfile {
    /// Attach the log file, writing everything logged so far into it.
    pub fn start(self, path: impl AsRef<Path>) -> FailResult<()> {
        let path = path.as_ref();
        let file = fsx::create(path)?;
        lock_logfile()?.attach(file)?;
        debug!("log file: {}", path.display());
        Ok(())
    }

    /// Don't write a log file at all.
    pub fn disable(self) {
        if let Ok(mut logfile) = GLOBAL_LOGFILE.lock() {
            *logfile = Logfile::Discarding;
        }
    }
}

fn lock_logfile() -> FailResult<std::sync::MutexGuard<'static, Logfile>> {
    GLOBAL_LOGFILE.lock().map_err(|_| format_err!("the log file lock was poisoned"))
}

/// Install the global logger. May only be called once per process.
pub fn init_global_logger() -> FailResult<SetGlobalLogfile> {
    let start = Instant::now();

    let terminal = fern::Dispatch::new()
        .format(move |out, message, record| {
            let t = start.elapsed();
            out.finish(format_args!("[{:>4}.{:03}s][{}][{}] {}",
                t.as_secs(),
                t.subsec_millis(),
                record.target(),
                ColorizedLevel(record.level()),
                message))
        })
        .chain(io::stdout());

    let file = fern::Dispatch::new()
        .format(move |out, message, record| {
            let t = start.elapsed();
            out.finish(format_args!("[{:>4}.{:03}s][{}][{}] {}",
                t.as_secs(),
                t.subsec_millis(),
                record.target(),
                record.level(),
                message))
        })
        .chain(Box::new(LogfileSink) as Box<dyn Log>);

    let mut dispatch = fern::Dispatch::new();
    match level_from_env()? {
        Some(level) => dispatch = dispatch.level(level),
        None => {
            dispatch = dispatch.level(LevelFilter::Info);
            for krate in MLPOT_CRATES {
                dispatch = dispatch.level_for(*krate, LevelFilter::Debug);
            }
        },
    }
    dispatch.chain(terminal).chain(file).apply()?;

    Ok(SetGlobalLogfile(()))
}

fn level_from_env() -> FailResult<Option<LevelFilter>> {
    match std::env::var(LOG_ENV_VAR) {
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => bail!("{}: {}", LOG_ENV_VAR, e),
        Ok(s) => match LevelFilter::from_str(s.trim()) {
            Ok(level) => Ok(Some(level)),
            Err(_) => bail!("{}: unknown log level {:?}", LOG_ENV_VAR, s),
        },
    }
}

#[derive(Debug, Copy, Clone)]
pub struct ColorizedLevel(pub Level);
impl fmt::Display for ColorizedLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let style = match self.0 {
            Level::Error => ansi_term::Colour::Red.bold(),
            Level::Warn  => ansi_term::Colour::Red.normal(),
            Level::Info  => ansi_term::Colour::Cyan.bold(),
            Level::Debug => ansi_term::Colour::Yellow.dimmed(),
            Level::Trace => ansi_term::Colour::Cyan.normal(),
        };
        write!(f, "{}", style.paint(self.0.to_string()))
    }
}

#[cfg(test)]
#[deny(unused)]
mod tests {
    use super::*;
    use mlpot_fs_util::TempDir;

    #[test]
    fn buffered_lines_are_replayed() {
        let dir = TempDir::new("mlpot-logging").unwrap();
        let path = dir.path().join("test.log");

        let mut logfile = Logfile::Buffering(vec![]);
        logfile.write_line("first".into());
        logfile.write_line("second".into());
        logfile.attach(fsx::create(&path).unwrap()).unwrap();
        logfile.write_line("third".into());

        assert_eq!(fsx::read_to_string(&path).unwrap(), "first\nsecond\nthird\n");

        let mut logfile = Logfile::Discarding;
        logfile.write_line("ignored".into());
        assert!(matches!(logfile, Logfile::Discarding));
    }

    #[test]
    fn colorized_level_keeps_the_name() {
        let text = ColorizedLevel(Level::Warn).to_string();
        assert!(text.contains("WARN"));
        assert_ne!(text, "WARN");
    }
}
