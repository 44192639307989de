use std::process;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use procg::{
    cli::{Cli, parse_args},
    error::ModuleError,
    modsym::load_symbol,
};

/// Entry point every test module is expected to export.
const TEST_SYMBOL: &str = "unit_tests";

/// Signature of the exported entry point: returns the number of failures.
type UnitTestFn = extern "C" fn() -> usize;

fn main() {
    let args = parse_args();
    init_logging(&args);

    match run(&args) {
        Ok(0) => {}
        Ok(failures) => {
            warn!("{failures} unit test(s) failed");
            process::exit(-(failures as i32));
        }
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    }
}

/// Runs every module's `unit_tests` entry point and sums the failures.
fn run(args: &Cli) -> Result<usize, ModuleError> {
    let mut failures = 0usize;

    for module in &args.modules {
        info!("running {TEST_SYMBOL} from {}", module.display());
        let symbol = load_symbol(TEST_SYMBOL, module)?;

        // SAFETY: the harness contract fixes the entry point's signature.
        let run_tests: UnitTestFn = unsafe { symbol.as_fn() };
        let failed = run_tests();
        if failed > 0 {
            warn!("{failed} failure(s) reported by {}", module.display());
        }
        failures += failed;
    }

    Ok(failures)
}

fn init_logging(args: &Cli) {
    let filter = if let Some(level) = args.log_level {
        EnvFilter::new(level.to_string())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
