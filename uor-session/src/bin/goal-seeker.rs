//! Scripted demo session: run the goal-seeker against the adaptive
//! Teacher and narrate the exchange.
//!
//! Usage: `goal-seeker [seed] [successes]`

use uor_session::{AdaptiveTeacher, Controller, Phase};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("uor_session=info,uor_runtime=warn")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let seed: u64 = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0xC0FFEE);
    let wanted: usize = args.next().and_then(|s| s.parse().ok()).unwrap_or(5);

    let mut controller = Controller::new(AdaptiveTeacher::new(seed));
    let mut snapshot = controller.init();
    println!(
        "session started: target {:?}, difficulty {}",
        snapshot.current_target, snapshot.difficulty_level
    );

    let mut successes = 0usize;
    let mut budget = 500_000usize;
    while successes < wanted && budget > 0 {
        budget -= 1;
        if snapshot.halted {
            break;
        }
        snapshot = if snapshot.needs_input {
            if snapshot.interaction_phase == Phase::SendTarget {
                successes += 1;
                println!(
                    "success #{successes}: guessed {:?}, next target {:?} ({})",
                    snapshot.output_log.last(),
                    snapshot.current_target,
                    snapshot.difficulty_level
                );
            }
            controller.provide_input(None)
        } else {
            controller.step()
        };
    }

    println!("output log: {:?}", snapshot.output_log);
    match &snapshot.error {
        Some(error) => println!("halted with error: {error}"),
        None => println!(
            "done after {successes} successes, difficulty {}",
            snapshot.difficulty_level
        ),
    }
}
