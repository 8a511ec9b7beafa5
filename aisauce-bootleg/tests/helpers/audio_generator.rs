//! Audio test fixture generator
//!
//! Short WAV files with optional tags, standing in for extractor output.

use aisauce_bootleg::services::tags::TagEditor;
use std::path::Path;

/// Write 100 ms of mono silence
pub fn write_wav(path: &Path) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for _ in 0..800 {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}

/// Write a WAV file carrying the given tags
pub fn write_tagged_wav(path: &Path, tags: &[(&str, &str)]) {
    write_wav(path);
    if tags.is_empty() {
        return;
    }

    let mut editor = TagEditor::open(path).unwrap();
    for (key, value) in tags {
        editor.set(key, &[value.to_string()]).unwrap();
    }
    editor.save().unwrap();
}
