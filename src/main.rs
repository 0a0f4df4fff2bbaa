//! Radar Loop command line
//!
//! Loads a pattern snapshot (or scatters a random one) and prints the warp
//! map: which loop position each input position ends up playing.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::f64::consts::TAU;
    use std::fs;

    use radar_loop::radar::{Pattern, Ray};

    const USAGE: &str = "usage: radar-loop (<pattern.json> | --random <seed> [--count <n>]) \
                         [--steps <n>] [--trace <angle>] [--save <out.json>]";

    enum Source {
        File(String),
        Random { seed: u64, count: usize },
    }

    struct Options {
        source: Source,
        steps: usize,
        trace: Option<f64>,
        save: Option<String>,
    }

    fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Result<T, String> {
        let value = value.ok_or_else(|| format!("{} needs a value", flag))?;
        value
            .parse()
            .map_err(|_| format!("invalid value for {}: {}", flag, value))
    }

    fn parse(mut args: impl Iterator<Item = String>) -> Result<Options, String> {
        let mut file = None;
        let mut seed = None;
        let mut count = 8;
        let mut steps = 16;
        let mut trace = None;
        let mut save = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--random" => seed = Some(parse_value("--random", args.next())?),
                "--count" => count = parse_value("--count", args.next())?,
                "--steps" => steps = parse_value("--steps", args.next())?,
                "--trace" => trace = Some(parse_value("--trace", args.next())?),
                "--save" => save = Some(parse_value("--save", args.next())?),
                "-h" | "--help" => return Err(USAGE.to_string()),
                flag if flag.starts_with("--") => return Err(format!("unknown option {}", flag)),
                _ if file.is_none() => file = Some(arg),
                _ => return Err(format!("unexpected argument {}", arg)),
            }
        }

        let source = match (file, seed) {
            (Some(path), None) => Source::File(path),
            (None, Some(seed)) => Source::Random { seed, count },
            _ => return Err(USAGE.to_string()),
        };
        if steps == 0 {
            return Err("--steps must be positive".to_string());
        }
        Ok(Options {
            source,
            steps,
            trace,
            save,
        })
    }

    fn run(options: Options) -> radar_loop::Result<()> {
        let pattern = match &options.source {
            Source::File(path) => {
                let pattern = Pattern::from_json(&fs::read_to_string(path)?)?;
                log::info!("Loaded {} ({} obstacles)", path, pattern.user_obstacles().len());
                pattern
            }
            Source::Random { seed, count } => Pattern::scatter(*seed, *count),
        };

        println!(
            "pattern: {} obstacles, origin ({:.3}, {:.3}), {} @ {} bpm x {} bars ({:.2}s)",
            pattern.user_obstacles().len(),
            pattern.origin().x,
            pattern.origin().y,
            pattern.file(),
            pattern.bpm(),
            pattern.bars(),
            pattern.loop_seconds()
        );

        let mut ray = Ray::new();
        println!("\n  in      out     bounces");
        for i in 0..options.steps {
            let input = i as f64 / options.steps as f64;
            let out = pattern.evaluate(&mut ray, input * TAU) / TAU;
            println!("  {:.4}  {:.4}  {}", input, out, ray.movements().saturating_sub(1));
        }

        if let Some(angle) = options.trace {
            println!("\ntrace from {:.4} rad:", angle);
            for snapshot in pattern.trace(&mut ray, angle) {
                println!(
                    "  #{:<3} ({:+.4}, {:+.4}){}",
                    snapshot.movements,
                    snapshot.pos.x,
                    snapshot.pos.y,
                    if snapshot.exceeded { "  budget exceeded" } else { "" }
                );
            }
        }

        if let Some(path) = &options.save {
            fs::write(path, pattern.to_json()?)?;
            log::info!("Saved pattern to {}", path);
        }
        Ok(())
    }

    pub fn main() {
        env_logger::init();

        let options = match parse(std::env::args().skip(1)) {
            Ok(options) => options,
            Err(message) => {
                eprintln!("{}", message);
                std::process::exit(2);
            }
        };
        if let Err(e) = run(options) {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }

}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    cli::main();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The worklet is driven through `radar_loop::worklet`
}
