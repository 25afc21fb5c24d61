use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use mix_dr::audio_io;
use mix_dr::audio_master::{self, MasterConfig};

/// Master a raw mono recording into a broadcast-ready WAV.
#[derive(Parser)]
#[command(author, version, about)]
struct Args {
    /// Input recording (WAV, M4A, MP3, AAC, or FLAC)
    input: PathBuf,
    /// Output WAV path
    output: PathBuf,
    /// Noise reduction intensity (0.0 = off, 1.0 = maximum)
    #[arg(long, default_value_t = 0.7)]
    noise_reduction: f32,
    /// Skip the reverb stage
    #[arg(long)]
    no_reverb: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let input = audio_io::decode_audio(&args.input)?;
    let config = MasterConfig {
        noise_reduction_strength: args.noise_reduction,
        apply_reverb: !args.no_reverb,
    };

    let (output, report) = audio_master::process(&input, &config)?;
    audio_io::write_wav(&args.output, &output)?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
