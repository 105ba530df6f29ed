//! CLI argument parsing and configuration

use clap::Parser;
use std::path::PathBuf;

/// audiometa - consolidated metadata report for one audio file
///
/// Combines container tags, stream properties, embedded artwork, a tempo and
/// timbre heuristic, a file-reputation lookup and optional speech
/// transcription into one JSON report, printed to stdout and saved to
/// output.json.
#[derive(Parser, Debug)]
#[command(name = "audiometa")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Audio file to analyze
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Where to write the JSON report
    #[arg(short, long, value_name = "PATH", default_value = "output.json")]
    pub output: PathBuf,

    /// Tempo above which a track is labelled "energetic" [default: 120]
    #[arg(long, value_name = "BPM")]
    pub tempo_threshold: Option<f32>,

    /// Mean zero-crossing rate above which a track is labelled "electronic" [default: 0.1]
    #[arg(long, value_name = "RATE")]
    pub zcr_threshold: Option<f32>,

    /// Do not write embedded artwork next to the input file
    #[arg(long, default_value = "false")]
    pub no_artwork: bool,

    /// ffprobe executable
    #[arg(long, value_name = "BIN", env = "AUDIOMETA_FFPROBE_BIN", default_value = "ffprobe")]
    pub ffprobe_bin: String,

    /// Seconds before the stream probe is killed
    #[arg(long, value_name = "SECS", default_value = "30")]
    pub probe_timeout: u64,

    /// Reputation service API key
    #[arg(long, value_name = "KEY", env = "VT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Reputation service API root
    #[arg(long, value_name = "URL", default_value = crate::config::settings::DEFAULT_REPUTATION_URL)]
    pub reputation_url: String,

    /// Seconds before the reputation lookup gives up
    #[arg(long, value_name = "SECS", default_value = "15")]
    pub reputation_timeout: u64,

    /// whisper.cpp CLI executable
    #[arg(long, value_name = "BIN", env = "AUDIOMETA_WHISPER_BIN", default_value = "whisper-cli")]
    pub whisper_bin: String,

    /// ggml model file for transcription
    #[arg(long, value_name = "PATH", env = "AUDIOMETA_WHISPER_MODEL")]
    pub whisper_model: Option<PathBuf>,

    /// Seconds before transcription is killed
    #[arg(long, value_name = "SECS", default_value = "600")]
    pub transcription_timeout: u64,

    /// Skip transcription even if whisper is installed
    #[arg(long, default_value = "false")]
    pub no_transcription: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

impl Cli {
    /// Get the log filter based on verbosity flags
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_is_optional() {
        let cli = Cli::try_parse_from(["audiometa"]).unwrap();
        assert!(cli.file.is_none());
        assert_eq!(cli.output, PathBuf::from("output.json"));
    }

    #[test]
    fn test_log_filter() {
        let cli = Cli::parse_from(["audiometa", "-vv", "a.mp3"]);
        assert_eq!(cli.log_filter(), "debug");
        let cli = Cli::parse_from(["audiometa", "-q", "-vvv", "a.mp3"]);
        assert_eq!(cli.log_filter(), "error");
    }

    #[test]
    fn test_rejects_bad_threshold() {
        assert!(Cli::try_parse_from(["audiometa", "--tempo-threshold", "fast", "a.mp3"]).is_err());
    }
}
