use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tts_studio::{
    engines::cloned::SilenceStub,
    engines::onnx::{OnnxModelLoader, OnnxModelParams},
    orchestrator::SynthesisOrchestrator,
    profiles::{Profile, ProfileStore},
    registry::ModelRegistry,
    voice::ClonedVoices,
    ModelId, SynthesisRequest,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut clones = ClonedVoices::new();
    clones.register("Clone: Laura", "clones/laura.wav");
    clones.register("Clone: Mark", "clones/mark.wav");
    let clones = Arc::new(clones);

    let loader = OnnxModelLoader::with_params(
        "models",
        OnnxModelParams {
            num_threads: None,
            optimized_cache_dir: Some(PathBuf::from("models/cache")),
        },
    );

    let load_start = Instant::now();
    let registry = Arc::new(ModelRegistry::new(
        Box::new(loader),
        clones.clone(),
        ModelId::VitsVctk,
    )?);
    println!("Default model loaded in {:.2?}", load_start.elapsed());

    let speakers = registry.ensure_loaded(ModelId::VitsVctk)?;
    println!("Available voices: {speakers:?}");

    let studio = SynthesisOrchestrator::new(registry, clones, Box::new(SilenceStub), "studio")?;

    let request = SynthesisRequest::builder()
        .text("Hello! This is the voice studio speaking.")
        .voice(speakers[0].clone())
        .emotion(0.7)
        .pitch_semitones(2)
        .speed(1.1)
        .build()?;

    let synth_start = Instant::now();
    let path = studio.synthesize(&request)?;
    println!(
        "Synthesized to {} in {:.2?}",
        path.display(),
        synth_start.elapsed()
    );

    // Cloned voices skip pitch/speed post-processing entirely.
    let cloned_request = SynthesisRequest::builder()
        .text("And this is a cloned voice.")
        .voice("Clone: Laura")
        .build()?;
    let cloned_path = studio.synthesize(&cloned_request)?;
    println!("Cloned synthesis archived at {}", cloned_path.display());

    let mut profiles = ProfileStore::open("profiles.json")?;
    profiles.save(
        "narrator",
        Profile {
            speaker_id: request.voice.clone(),
            emotion: request.emotion,
            pitch: request.pitch_semitones,
            speed: request.speed,
        },
    )?;
    println!("Saved profiles: {:?}", profiles.names());

    let narrator = profiles.load("narrator");
    println!(
        "Loaded profile 'narrator': speaker={} emotion={} pitch={} speed={}",
        narrator.speaker_id, narrator.emotion, narrator.pitch, narrator.speed
    );

    Ok(())
}
