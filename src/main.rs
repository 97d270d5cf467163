use flexi_logger::{FileSpec, Logger};
use gapartition::param::{self, Param};
use gapartition::puzzle::Puzzle;
use gapartition::report::{self, Report};
use gapartition::run;
use log::{error, info, warn};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::env;
use std::path::Path;
use std::process::exit;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Config dump printed before the run, one `name = value` line per field
fn settings(param: &Param) -> String {
    let seed = if param.general.random_seed {
        "random".to_string()
    } else {
        param.general.seed.to_string()
    };
    format!(
        "population_size   = {}\n\
         length            = {}\n\
         crossover_rate    = {:.6}\n\
         mutation_rate     = {:.6}\n\
         max_generations   = {}\n\
         stagnation_factor = {}\n\
         sum_target        = {}\n\
         product_target    = {}\n\
         max_error         = {:.6}\n\
         seed              = {}\n",
        param.ga.population_size,
        param.puzzle.length,
        param.ga.crossover_rate,
        param.ga.mutation_rate,
        param.ga.max_generations,
        param.ga.stagnation_factor,
        param.puzzle.sum_target,
        param.puzzle.product_target,
        param.puzzle.max_error,
        seed
    )
}

fn main() {
    // A single optional argument names the param file. Without one,
    // param.yaml is used when present, otherwise the built-in defaults.
    let args: Vec<String> = env::args().collect();
    let param = if args.len() > 1 {
        match param::get(args[1].clone()) {
            Ok(param) => param,
            Err(e) => {
                eprintln!("Could not load {}: {}", args[1], e);
                exit(2);
            }
        }
    } else if Path::new("param.yaml").exists() {
        match param::get("param.yaml".to_string()) {
            Ok(param) => param,
            Err(e) => {
                eprintln!("Could not load param.yaml: {}", e);
                exit(2);
            }
        }
    } else {
        Param::default()
    };

    // RUST_LOG wins over the configured level; a non-empty log_base moves
    // logging from the terminal to a file
    let logger = Logger::try_with_env_or_str(&param.general.log_level).unwrap();
    let _logger = if param.general.log_base.is_empty() {
        logger.start().unwrap()
    } else {
        logger
            .log_to_file(
                FileSpec::default()
                    .basename(param.general.log_base.as_str())
                    .suffix(param.general.log_suffix.as_str()),
            )
            .start()
            .unwrap()
    };

    info!("gapartition {}", report::version());

    let puzzle = match Puzzle::from_param(&param) {
        Ok(puzzle) => puzzle,
        Err(e) => {
            error!("Invalid puzzle: {}", e);
            exit(2);
        }
    };

    let running = Arc::new(AtomicBool::new(true));
    let watcher_flag = running.clone();
    match Signals::new([SIGINT, SIGTERM]) {
        Ok(mut signals) => {
            thread::spawn(move || {
                for signal in signals.forever() {
                    warn!(
                        "Received signal {}, stopping after the current generation",
                        signal
                    );
                    watcher_flag.store(false, Ordering::Relaxed);
                }
            });
        }
        Err(e) => warn!("Could not register signal handlers: {}", e),
    }

    println!("\nGA Info:");
    println!("------------------------------");
    if param.general.display_colorful {
        print!("\x1B[36m{}\x1B[0m", settings(&param));
    } else {
        print!("{}", settings(&param));
    }
    println!("\nGA Result:");
    println!("------------------------------");

    let outcome = match run(&param, running) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("{}", e);
            exit(2);
        }
    };

    println!("{}", outcome.display(&puzzle, param.general.display_colorful));

    if !param.general.save_result.is_empty() {
        let report = Report::new(&param, &outcome);
        if let Err(e) = report.save_json(&param.general.save_result) {
            error!(
                "Could not save result to {}: {}",
                param.general.save_result, e
            );
        }
    }

    if !outcome.is_found() {
        exit(1);
    }
}
