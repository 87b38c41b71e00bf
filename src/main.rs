use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;

use plotters::style::{BLUE, RED};
use structopt::StructOpt;
use tracing::info;
use tracing_subscriber::EnvFilter;

use actor_critic::env::{Env, GamblerEnv, HanoiEnv, PoleBalancingEnv};
use actor_critic::utils::{moving_average, plot_moving_average, shared_rng, SharedRng};
use actor_critic::{AppConfig, ProblemConfig, Trainer};

/// Train an actor-critic learner with eligibility traces on a simulated world
#[derive(StructOpt, Debug)]
#[structopt(name = "actor_critic")]
struct Cli {
    /// TOML configuration file; defaults are used when it does not exist
    #[structopt(long = "config", short = "c", default_value = "configs/cartpole.toml")]
    config: PathBuf,

    /// Overrides the number of training episodes
    #[structopt(long = "episodes", short = "n")]
    episodes: Option<usize>,

    /// Overrides the random seed
    #[structopt(long = "seed")]
    seed: Option<u64>,

    /// Directory where the game length charts are written
    #[structopt(long = "plot")]
    plot: Option<PathBuf>,

    /// Show example of episode
    #[structopt(long = "show_example")]
    show_example: bool,

    /// Moving average window to be used on the visualization of results
    #[structopt(long = "moving_average_window", default_value = "20")]
    moving_average_window: usize,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli: Cli = Cli::from_args();
    let mut config = AppConfig::load_or_default(&cli.config)?;
    if let Some(episodes) = cli.episodes {
        config.trainer.episodes = episodes;
        config.trainer.checkpoints = config.trainer.checkpoints.min(episodes);
    }
    if cli.seed.is_some() {
        config.trainer.seed = cli.seed;
    }
    config.validate()?;

    info!(problem = config.problem.name(), "loaded configuration");
    let rng = shared_rng(config.trainer.seed);
    match &config.problem {
        ProblemConfig::Cartpole(world) => {
            let env = PoleBalancingEnv::new(*world, rng.clone());
            run(env, &config, rng, &cli)?;
        }
        ProblemConfig::Hanoi(world) => {
            let trainer = run(HanoiEnv::new(*world), &config, rng, &cli)?;
            let best = trainer.env().best_history();
            println!("Shortest game took {} moves", best.len().saturating_sub(1));
            if cli.show_example {
                for state in best {
                    println!("{}", state.render());
                }
            }
        }
        ProblemConfig::Gambler(world) => {
            let env = GamblerEnv::new(*world, rng.clone());
            run(env, &config, rng, &cli)?;
        }
    }
    Ok(())
}

fn run<E: Env>(
    env: E,
    config: &AppConfig,
    rng: SharedRng,
    cli: &Cli,
) -> Result<Trainer<E>, Box<dyn Error>> {
    let mut trainer = Trainer::new(env, &config.trainer, &config.critic, rng);

    let now: Instant = Instant::now();
    let results = trainer.train()?;
    let elapsed: std::time::Duration = now.elapsed();
    println!("Training done in {:.2?}", elapsed);

    for summary in &results.checkpoints {
        println!(
            "checkpoint {:>3}: mean length {:>8.2}, successes {:>4}/{}, epsilon {:.4}",
            summary.checkpoint,
            summary.mean_length,
            summary.successes,
            summary.episodes,
            summary.epsilon
        );
    }
    println!("Demonstration lengths: {:?}", results.demonstration_lengths);

    if cli.show_example {
        for frame in trainer.example()? {
            println!("{}", frame);
        }
    }

    if let Some(dir) = &cli.plot {
        std::fs::create_dir_all(dir)?;
        let window = cli.moving_average_window;
        let lengths: Vec<f64> = results.episode_lengths.iter().map(|x| *x as f64).collect();
        plot_moving_average(
            &dir.join("episode_length.png"),
            &[moving_average(window, &lengths)],
            &[BLUE],
            &["game length"],
            "Train Episodes Length",
        )?;
        plot_moving_average(
            &dir.join("td_error.png"),
            &[moving_average(window, &results.td_errors)],
            &[RED],
            &["mean |TD error|"],
            "Training Error",
        )?;
        info!(dir = %dir.display(), "charts written");
    }
    Ok(trainer)
}
