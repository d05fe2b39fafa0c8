use anyhow::Result;
use clap::{Parser, ValueEnum};
use log::info;
use rlsolve::{
    DqnConfig, DqnSolver, EnvSpace, GridSpace, Solver, SolverConfig, TabularEnv, TdConfig,
    TdSolver,
};

const MAX_STEPS_PER_EPISODE: usize = 200;
const STEP_PENALTY: f64 = -0.01;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SolverKind {
    Td,
    Dqn,
}

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Solver to train
    #[arg(short, long, value_enum, default_value_t = SolverKind::Td)]
    solver: SolverKind,

    /// Width of the grid
    #[arg(long, default_value_t = 5)]
    width: usize,

    /// Height of the grid
    #[arg(long, default_value_t = 5)]
    height: usize,

    /// Number of training episodes
    #[arg(short, long, default_value_t = 200)]
    episodes: usize,

    /// YAML file of the solver configuration
    #[arg(short, long)]
    config: Option<String>,

    /// Save the DQN snapshot to this JSON file
    #[arg(long)]
    snapshot: Option<String>,
}

/// Grid world whose goal is the last cell.
struct GridWorld {
    space: GridSpace,
    state: usize,
}

impl GridWorld {
    fn new(space: GridSpace) -> Self {
        Self { space, state: 0 }
    }

    fn goal(&self) -> usize {
        self.space.number_of_states() - 1
    }

    fn step(&mut self, a: usize) -> (f64, bool) {
        let h = self.space.height();
        self.state = match a {
            0 => self.state - h,
            1 => self.state - 1,
            2 => self.state + 1,
            _ => self.state + h,
        };
        if self.state == self.goal() {
            self.state = 0;
            (1.0, true)
        } else {
            (STEP_PENALTY, false)
        }
    }

    /// One-hot encoding of the current cell.
    fn one_hot(&self) -> Vec<f32> {
        let mut v = vec![0f32; self.space.number_of_states()];
        v[self.state] = 1.0;
        v
    }
}

/// Runs episodes, returns the number of steps of each.
fn run<S, F>(solver: &mut S, world: &mut GridWorld, episodes: usize, obs: F) -> Result<Vec<usize>>
where
    S: Solver,
    F: Fn(&GridWorld) -> Box<S::State>,
{
    let mut lengths = Vec::with_capacity(episodes);

    for episode in 0..episodes {
        let mut steps = 0;
        loop {
            steps += 1;
            let a = solver.decide(&*obs(world))?;
            let (r, done) = world.step(a);
            solver.learn(r)?;
            if done || steps == MAX_STEPS_PER_EPISODE {
                break;
            }
        }
        if (episode + 1) % 20 == 0 {
            info!("episode {:>5}: {} steps", episode + 1, steps);
        }
        lengths.push(steps);
    }

    Ok(lengths)
}

fn print_policy(solver: &TdSolver<GridSpace>, space: &GridSpace) {
    let arrows = ['<', '^', 'v', '>'];
    for y in 0..space.height() {
        let row = (0..space.width())
            .map(|x| {
                let s = x * space.height() + y;
                space
                    .allowed_actions(s)
                    .into_iter()
                    .max_by(|&a1, &a2| solver.q(s, a1).total_cmp(&solver.q(s, a2)))
                    .map_or(' ', |a| arrows[a])
            })
            .collect::<String>();
        println!("{}", row);
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let space = GridSpace::new(args.width, args.height);
    let mut world = GridWorld::new(space);

    match args.solver {
        SolverKind::Td => {
            let config = match &args.config {
                Some(path) => TdConfig::load(path)?,
                None => TdConfig::default().alpha(0.3).gamma(0.95).number_of_planning_steps(10),
            };
            let mut solver = TdSolver::build(space, config)?;
            let lengths = run(&mut solver, &mut world, args.episodes, |w| Box::new(w.state))?;
            info!("last episode: {:?} steps", lengths.last());
            print_policy(&solver, &space);
        }
        SolverKind::Dqn => {
            let config = match &args.config {
                Some(path) => DqnConfig::load(path)?,
                None => DqnConfig::default()
                    .number_of_hidden_units(vec![32])
                    .epsilon_decay_period(5_000)
                    .keep_experience_interval(1)
                    .experience_size(10_000),
            };
            let mut solver = DqnSolver::build(space, config)?;
            let lengths = run(&mut solver, &mut world, args.episodes, |w| {
                w.one_hot().into_boxed_slice()
            })?;
            info!("last episode: {:?} steps", lengths.last());

            if let Some(path) = &args.snapshot {
                std::fs::write(path, serde_json::to_string_pretty(&solver.to_json()?)?)?;
                info!("Saved snapshot to {}", path);
            }
        }
    }

    Ok(())
}
