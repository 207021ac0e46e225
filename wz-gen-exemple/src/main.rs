use clap::Parser;
use log::info;
use wz_gen_core::model::generator::Generator;
use wz_gen_core::model::weights::Distribution;
use wz_gen_core::session::{run, SessionOptions};

/// Generate words from a YAML phonology.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Number of words to generate
    #[arg(short, long, default_value_t = 10)]
    words: usize,

    /// Number of syllables per word
    #[arg(short, long, default_value_t = 2)]
    syllables: usize,

    /// Weight distribution: "zipf" or "poisson"
    #[arg(short, long, default_value = "zipf")]
    distribution: Distribution,

    /// Phonology file (the bundled Wizard phonology when omitted)
    #[arg(short, long)]
    file: Option<String>,

    /// Keep generation order instead of sorting alphabetically
    #[arg(long)]
    unsorted: bool,

    /// Allow the same word several times
    #[arg(long)]
    allow_duplicates: bool,

    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Also compare both distributions over every phonology of this directory
    #[arg(long)]
    compare: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let options = SessionOptions {
        words: cli.words,
        syllables: cli.syllables,
        distribution: cli.distribution,
        file: cli.file,
        alpha: !cli.unsorted,
        deduplicate: !cli.allow_duplicates,
        seed: cli.seed,
        max_attempts: None,
    };
    println!("{}", run(&options)?);

    if let Some(folder) = cli.compare {
        // Load all phonologies from the directory (.yml / .yaml files)
        let mut generator = Generator::new(&folder)?;
        if let Some(seed) = cli.seed {
            generator = generator.seeded(seed);
        }
        info!("Comparing distributions over {:?}", generator.get_phonology_names());

        for name in generator.get_phonology_names() {
            for distribution in [Distribution::Zipf, Distribution::Poisson] {
                let phonology = generator.compile(&name, distribution)?;
                let mut input = generator.make_batch_input(5, cli.syllables)?;
                input.sort = true;

                // A tiny phonology may not have five distinct words to offer
                match generator.generate_batch(&phonology, &input) {
                    Ok(words) => println!("{name} ({distribution}): {}", words.join(", ")),
                    Err(e) => println!("{name} ({distribution}): {e}"),
                }
            }
        }
    }

    Ok(())
}
