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

//! The `main` functions of the binaries, which live here so that they can share
//! the crate's error handling and logging.

use crate::FailResult;
use crate::cmd::{TrainArgs, run_train, PredictArgs, run_predict};
use crate::ui::logging::init_global_logger;

use clap::{App, Arg, ArgMatches};
use std::ffi::OsStr;
use std::path::PathBuf;

fn wrap_result_main<F>(main: F)
where F: FnOnce() -> FailResult<()>,
{
    main().unwrap_or_else(|e| {
        for cause in e.iter_chain() {
            error!("{}", cause);
        }

        if std::env::var_os("RUST_BACKTRACE") == Some(OsStr::new("1").to_owned()) {
            error!("{}", e.backtrace());
        } else {
            error!("\
                (If you found the above error message to be particularly lacking in \
                detail, try again with RUST_BACKTRACE=1)\
            ");
        }
        std::process::exit(1);
    });
}

fn required_path(m: &ArgMatches<'_>, name: &str) -> FailResult<PathBuf> {
    match m.value_of_os(name) {
        Some(s) => Ok(PathBuf::from(s)),
        None => bail!("missing required argument: {}", name),
    }
}

fn parse_count(m: &ArgMatches<'_>, name: &str, default: usize) -> FailResult<usize> {
    match m.value_of(name) {
        None => Ok(default),
        Some(s) => s.parse().map_err(|e| format_err!("--{}: {}: {:?}", name, e, s)),
    }
}

// %% CRATES: binary: mlpot-train %%
pub fn train() {
    wrap_result_main(|| {
        let logfile = init_global_logger()?;

        let matches = App::new("mlpot-train")
            .version(crate_version!())
            .about("Fit a kernel potential to the ionic steps of an OUTCAR.")
            .args(&[
                Arg::with_name("config")
                    .short("c").long("config").value_name("CONFIG")
                    .takes_value(true).required(true)
                    .help("settings yaml"),
                Arg::with_name("output")
                    .short("o").long("output").value_name("MODEL_DIR")
                    .takes_value(true).required(true)
                    .help("output model directory"),
                Arg::with_name("force")
                    .short("f").long("force")
                    .help("replace an existing model directory"),
                Arg::with_name("outcar")
                    .value_name("OUTCAR").required(true)
                    .help("VASP OUTCAR with the training data"),
            ])
            .get_matches();

        let args = TrainArgs {
            settings: required_path(&matches, "config")?,
            outcar: required_path(&matches, "outcar")?,
            model_dir: required_path(&matches, "output")?,
            force: matches.is_present("force"),
        };
        run_train(&args, Some(logfile))?;
        Ok(())
    });
}

// %% CRATES: binary: mlpot-predict %%
pub fn predict() {
    wrap_result_main(|| {
        let logfile = init_global_logger()?;
        logfile.disable();

        let matches = App::new("mlpot-predict")
            .version(crate_version!())
            .about("Apply a trained model to the ionic steps of an OUTCAR.")
            .args(&[
                Arg::with_name("model")
                    .short("m").long("model").value_name("MODEL_DIR")
                    .takes_value(true).required(true)
                    .help("model directory written by mlpot-train"),
                Arg::with_name("offset")
                    .long("offset").value_name("N")
                    .takes_value(true)
                    .help("skip the first N ionic steps [default: 0]"),
                Arg::with_name("step-size")
                    .long("step-size").value_name("N")
                    .takes_value(true)
                    .help("only use every N-th ionic step [default: 1]"),
                Arg::with_name("output")
                    .short("o").long("output").value_name("JSON")
                    .takes_value(true)
                    .help("write predictions to this file"),
                Arg::with_name("outcar")
                    .value_name("OUTCAR").required(true)
                    .help("VASP OUTCAR to predict"),
            ])
            .get_matches();

        let step_size = parse_count(&matches, "step-size", 1)?;
        ensure!(step_size > 0, "--step-size must be at least 1");

        let args = PredictArgs {
            model_dir: required_path(&matches, "model")?,
            outcar: required_path(&matches, "outcar")?,
            offset: parse_count(&matches, "offset", 0)?,
            step_size,
            output: matches.value_of_os("output").map(PathBuf::from),
        };
        run_predict(&args)?;
        Ok(())
    });
}
