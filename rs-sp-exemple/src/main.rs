use std::env;
use std::path::Path;

use rs_sp_core::io::build_output_path;
use rs_sp_core::{
    Corpus, Event, Exposure, LearnerKind, LearnerSnapshot, ProductivityPipeline, ProductivityReport, SpConfig,
    TieBreak,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// A few decades of psych verbs, with counts per period and how many of
/// them already take the new argument structure.
const BUILT_IN: [(&str, i64, usize, usize); 14] = [
    ("loven", 1250, 40, 2),
    ("dreden", 1250, 25, 0),
    ("haten", 1250, 12, 1),
    ("plesen", 1250, 6, 0),
    ("loven", 1300, 35, 9),
    ("dreden", 1300, 20, 4),
    ("haten", 1300, 10, 3),
    ("wonderen", 1300, 4, 2),
    ("loven", 1350, 30, 20),
    ("dreden", 1350, 18, 10),
    ("plesen", 1350, 7, 5),
    ("wonderen", 1350, 5, 4),
    ("fearen", 1350, 3, 3),
    ("admiren", 1350, 2, 2),
];

fn built_in_corpus() -> Corpus {
    let mut events = Vec::new();
    for (lemma, time, count, following) in BUILT_IN {
        for i in 0..count {
            events.push(Event::new(lemma, time, true, i < following));
        }
        // Out-of-class clauses only add corpus mass
        for _ in 0..count / 2 {
            events.push(Event::new("been", time, false, false));
        }
    }
    Corpus::new("built-in", events)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    // A window of 120 clauses, and a trimmed vocabulary of the 5 most frequent types.
    // Equal frequencies are ranked with a seeded generator, so reruns are identical.
    let config = SpConfig::new(120, 5)?.with_tie_break(TieBreak::Seeded { seed: 42 });

    // Either a corpus file given on the command line, or the built-in corpus.
    // For a file, the report is cached next to it (.bin) and reused if the
    // configuration has not changed.
    let report = match env::args().nth(1) {
        Some(path) => run_cached(Path::new(&path), config)?,
        None => ProductivityPipeline::new(config)?.run(&built_in_corpus())?,
    };

    // One line per snapshot: N types the learner knows, M exceptions, θN threshold
    for learner in LearnerKind::ALL {
        println!("{learner} ({:?}, {:?})", learner.exposure(), learner.experience());
        for snapshot in report.series(learner) {
            println!(
                "  {}: N = {:3}, M = {:3}, θN = {:3}, margin = {:4} {}",
                snapshot.time,
                snapshot.n,
                snapshot.m,
                snapshot.theta_n,
                snapshot.margin,
                if snapshot.sufficient { "productive" } else { "" }
            );
        }
    }

    // Experienced vs inexperienced, side by side
    for point in report.comparison(Exposure::Synchronic) {
        let show = |snapshot: Option<&LearnerSnapshot>| match snapshot {
            Some(s) => format!("{}/{}", s.m, s.theta_n),
            None => "-".to_owned(),
        };
        println!(
            "synchronic at {}: experienced {} vs inexperienced {}",
            point.time,
            show(point.experienced.as_ref()),
            show(point.inexperienced.as_ref())
        );
    }

    // Where each synchronic window begins
    for span in report.window_spans() {
        println!("window at {} starts at {} (span {})", span.time, span.start_time, span.span());
    }

    println!("{}", report.summary());
    Ok(())
}

fn run_cached(path: &Path, config: SpConfig) -> Result<ProductivityReport, Box<dyn std::error::Error>> {
    let cache = build_output_path(path, "bin")?;
    if cache.exists() {
        match ProductivityReport::load(&cache) {
            Ok(report) if *report.config() == config => {
                info!(cache = %cache.display(), "Report loaded from cache");
                return Ok(report);
            }
            _ => info!(cache = %cache.display(), "Stale cache, rerunning"),
        }
    }

    let corpus = Corpus::from_file(path)?;
    let report = ProductivityPipeline::new(config)?.run(&corpus)?;
    report.save(&cache)?;
    Ok(report)
}
