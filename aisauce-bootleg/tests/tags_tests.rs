//! Tag reading and writing on real files

mod helpers;

use aisauce_bootleg::models::MinimalMetaData;
use aisauce_bootleg::services::tags::{read_tags, TagEditor};
use helpers::audio_generator::{write_tagged_wav, write_wav};

#[test]
fn test_untagged_file_has_no_tags() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.wav");
    write_wav(&path);

    assert!(read_tags(&path).unwrap().is_empty());
}

#[test]
fn test_written_tags_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tagged.wav");
    write_tagged_wav(
        &path,
        &[
            ("TITLE", "Shape Of You (IZUK Bootleg)"),
            ("ARTIST", "IZUK"),
            ("ALBUM", "Bootlegs"),
            ("GENRE", "Drum And Bass"),
        ],
    );

    let tags = read_tags(&path).unwrap();
    assert_eq!(tags["TITLE"], vec!["Shape Of You (IZUK Bootleg)"]);
    assert_eq!(tags["ARTIST"], vec!["IZUK"]);
    assert_eq!(tags["ALBUM"], vec!["Bootlegs"]);
    assert_eq!(tags["GENRE"], vec!["Drum And Bass"]);
}

#[test]
fn test_metadata_projection_writes_all_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("meta.wav");
    write_wav(&path);

    let meta = MinimalMetaData::new("Title", "Artist", "Album", "", "Genre", "");
    let mut editor = TagEditor::open(&path).unwrap();
    for (key, value) in meta.to_tag_dict() {
        editor.set(key, &[value.to_string()]).unwrap();
    }
    editor.save().unwrap();

    let tags = read_tags(&path).unwrap();
    assert_eq!(tags["ALBUMARTIST"], vec!["Artist"]);
    assert_eq!(tags["TITLE"], vec!["Title"]);
    // Empty fields are not written
    assert!(!tags.contains_key("DATE"));
}

#[test]
fn test_set_replaces_and_empty_removes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("edit.wav");
    write_tagged_wav(&path, &[("TITLE", "Old"), ("ALBUM", "Gone")]);

    let mut editor = TagEditor::open(&path).unwrap();
    editor.set("TITLE", &["New".to_string()]).unwrap();
    editor.set("ALBUM", &[String::new()]).unwrap();
    editor.save().unwrap();

    let tags = read_tags(&path).unwrap();
    assert_eq!(tags["TITLE"], vec!["New"]);
    assert!(!tags.contains_key("ALBUM"));
}

#[test]
fn test_clear_removes_everything() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clear.wav");
    write_tagged_wav(&path, &[("TITLE", "T"), ("ARTIST", "A"), ("COMMENT", "got this from a friend")]);

    let mut editor = TagEditor::open(&path).unwrap();
    editor.clear();
    editor.set("TITLE", &["Kept".to_string()]).unwrap();
    editor.save().unwrap();

    let tags = read_tags(&path).unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags["TITLE"], vec!["Kept"]);
}
