/// Instruction sent alongside an uploaded audio file.
pub const AUDIO_ANALYSIS: &str = include_str!("../data/prompts/audio_analysis.txt");
