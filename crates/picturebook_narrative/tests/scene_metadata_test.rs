//! Tests for scene metadata extraction, stripping and clothing detection.

use picturebook_core::ClothingCategory;
use picturebook_narrative::{
    extract_scene_metadata, extract_structured_metadata, parse_clothing_category,
    strip_scene_metadata,
};

const SCENE_WITH_BLOCK: &str = r#"Mia and Leo slide down the hill on a red sled while the fox watches from the trees.

```json
{
  "characters": ["Mia", {"name": "Leo", "position": "behind"}],
  "clothing": "winter",
  "objects": [{"name": "red sled"}, "snow fox"],
  "camera": "wide"
}
```

Soft evening light, long blue shadows."#;

#[test]
fn test_structured_block_is_authoritative() {
    let metadata = extract_scene_metadata(SCENE_WITH_BLOCK).expect("metadata");
    assert_eq!(metadata.characters, vec!["Mia", "Leo"]);
    assert_eq!(metadata.clothing, Some(ClothingCategory::Winter));
    assert_eq!(metadata.objects, vec!["red sled", "snow fox"]);
}

#[test]
fn test_strip_removes_only_the_block() {
    let stripped = strip_scene_metadata(SCENE_WITH_BLOCK);

    assert!(!stripped.contains("```"));
    assert!(!stripped.contains("\"characters\""));
    assert_eq!(
        stripped,
        "Mia and Leo slide down the hill on a red sled while the fox watches from the trees.\n\nSoft evening light, long blue shadows."
    );

    // What stripping removed is exactly what the block carried.
    assert!(extract_structured_metadata(&stripped).is_none());
    assert_eq!(
        extract_structured_metadata(SCENE_WITH_BLOCK),
        extract_scene_metadata(SCENE_WITH_BLOCK)
    );
}

#[test]
fn test_strip_without_block_is_identity() {
    let scene = "Mia waves.\n\nLeo waves back.";
    assert_eq!(strip_scene_metadata(scene), scene);
}

#[test]
fn test_text_fallbacks_in_order() {
    let section = "Characters:\n- Mia: waving\n\nMain characters: Leo";
    assert_eq!(
        extract_scene_metadata(section).map(|m| m.characters),
        Some(vec!["Mia".to_string()])
    );

    let phrase = "The kitchen smells of cookies. Hauptfiguren: Oma, Mia und Leo.";
    assert_eq!(
        extract_scene_metadata(phrase).map(|m| m.characters),
        Some(vec!["Oma".to_string(), "Mia".to_string(), "Leo".to_string()])
    );

    let composition = "Composition:\n- Left: **Mia** with a lantern\n- Right: **Leo** pointing up\n";
    assert_eq!(
        extract_scene_metadata(composition).map(|m| m.characters),
        Some(vec!["Mia".to_string(), "Leo".to_string()])
    );
}

#[test]
fn test_clothing_from_text() {
    let cases = [
        ("Clothing: winter coats and hats", Some(ClothingCategory::Winter)),
        ("**Outfit:**\nsummer dresses", Some(ClothingCategory::Summer)),
        ("Kleidung: festlich", Some(ClothingCategory::Formal)),
        ("Tenue : normale", Some(ClothingCategory::Standard)),
        ("The clothing they wear is, as always, their standard everyday outfits.", Some(ClothingCategory::Standard)),
        ("Clothing: rain gear", None),
        ("Mia loves summer.", None),
    ];
    for (scene, expected) in cases {
        assert_eq!(parse_clothing_category(scene), expected, "scene: {scene:?}");
    }
}
