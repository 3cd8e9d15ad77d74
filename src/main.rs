//! UI/UX Genome Lab CLI - Run a design research job from JSON configuration.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use uiux_genome_lab::{
    lab::{CatalogGenerator, HeuristicEvaluator, JsonReporter},
    schema::{LabConfig, ResearchPhase, ResearchResult},
    search::ResearchEngine,
};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <config.json>", args[0]);
        eprintln!();
        eprintln!("Run an evolutionary UI/UX design research job.");
        eprintln!();
        eprintln!("Arguments:");
        eprintln!("  config.json  Path to lab configuration file");
        eprintln!();
        eprintln!("Example configuration is generated with --example flag.");
        std::process::exit(1);
    }

    if args[1] == "--example" {
        print_example_config();
        return;
    }

    let config_path = PathBuf::from(&args[1]);

    // Load configuration
    let config_str = fs::read_to_string(&config_path).unwrap_or_else(|e| {
        eprintln!("Error reading config file: {}", e);
        std::process::exit(1);
    });

    let config: LabConfig = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        eprintln!("Error parsing config: {}", e);
        std::process::exit(1);
    });

    if let Err(e) = config.validate() {
        eprintln!("Invalid config: {}", e);
        std::process::exit(1);
    }

    let research = &config.research;
    println!("UI/UX Genome Lab");
    println!("================");
    println!("Problem: {}", research.problem_statement);
    println!("Platform: {}", research.target_platform);
    println!("Tone: {}", research.brand_tone);
    println!(
        "Population: {} x {} generations (budget {:.0}s)",
        research.population_size,
        research.max_generations,
        research.max_duration.as_secs_f64()
    );
    println!();

    let generator = match config.random_seed {
        Some(seed) => CatalogGenerator::new(seed),
        None => CatalogGenerator::random(),
    };

    let mut engine = ResearchEngine::new(
        config.research.clone(),
        generator,
        HeuristicEvaluator::new(true),
    )
    .with_reporter(JsonReporter::new(&config.output_dir));

    println!("Running research...");
    let start = Instant::now();

    let outcome = engine.run_with_callback(|progress| {
        if progress.phase == ResearchPhase::Selecting {
            println!(
                "  Generation {}/{}: seen={}, best={}",
                progress.generation + 1,
                progress.max_generations,
                progress.candidates_seen,
                progress
                    .best_fitness
                    .map_or_else(|| "-".to_string(), |f| format!("{:.3}", f))
            );
        }
    });

    let elapsed = start.elapsed();
    println!();

    match outcome {
        Ok(result) => {
            print_summary(&result);
            if let Some(receipt) = engine.publication() {
                println!("Bundle: {}", receipt.bundle_dir.display());
                println!("Index: {}", receipt.index_path.display());
            }
            println!("Time: {:.2}s", elapsed.as_secs_f32());
        }
        Err(failure) => {
            eprintln!("Research failed: {}", failure);
            if let Some(partial) = &failure.partial {
                eprintln!(
                    "Partial result: {} candidates over {} generations",
                    partial.all_candidates().len(),
                    partial.generations_completed()
                );
            }
            std::process::exit(1);
        }
    }
}

fn print_summary(result: &ResearchResult) {
    println!("Job: {}", result.job_id());
    println!("Status: {:?}", result.status());
    if let Some(reason) = result.stop_reason() {
        println!("Stopped: {:?}", reason);
    }
    println!("Generations: {}", result.generations_completed());
    println!("Candidates: {}", result.all_candidates().len());
    println!();

    match result.best_candidate() {
        Some(best) => {
            println!("Best concept: {} [{}]", best.name, best.id());
            println!("  {}", best.summary);
            if let Some(fitness) = best.fitness() {
                println!("  Fitness: {:.3}", fitness);
            }
            println!("  Layout: {}", best.spec.layout_pattern);
            println!("  Navigation: {}", best.spec.navigation_pattern);
            println!("  Accessibility: {}", best.spec.accessibility_notes);
        }
        None => println!("No fully scored concept was found."),
    }
    println!();
}

fn print_example_config() {
    let config = LabConfig::default();

    println!("Example configuration (config.json):");
    match serde_json::to_string_pretty(&config) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing example config: {}", e);
            std::process::exit(1);
        }
    }
}
