//! Tests for outline parsing across the supported outline dialects and languages.

use picturebook_core::ClothingCategory;
use picturebook_error::{OutlineErrorKind, PicturebookErrorKind};
use picturebook_narrative::Outline;

const WINTER_OUTLINE: &str = r#"
# Story Outline

**Mia and the Snow Fox**

Primary Clothing: standard

Clothing Changes:
- Page 6: Mia and Leo pack for the beach → summer

---TITLE PAGE---
Setting: a snowy hill at dusk
Characters: Mia and Leo
Action: sledding towards the reader
Clothing: winter

---INITIAL PAGE---
Mia's window with frost flowers and a small fox footprint on the sill.

---BACK COVER---
Setting: the garden under stars
Mood: sleepy and warm

## Page 1
Scene: Mia wakes up and looks out at a quiet street.
Text: Mia yawned.

## Page 2
Scene: Mia and Leo eat pancakes in the kitchen.

## Page 3: Clothing: winter
Scene: Mia and Leo step into the deep snow.

## Page 4
Scene: Leo spots fox tracks near the fence.
Clothing: same

## Page 5
Scene: The fox peeks out from behind a pine tree.
Clothing: same as before

## Page 6
Scene: Everyone waves goodbye to the fox in spring.
"#;

#[test]
fn test_title_from_bold_line() {
    let outline = Outline::new(WINTER_OUTLINE);
    assert_eq!(
        outline.extract_title().as_deref(),
        Some("Mia and the Snow Fox")
    );
}

#[test]
fn test_plain_line_after_outline_heading_is_title() {
    let outline = Outline::new(
        "# Story Outline\n\nMia and the Snow Fox\n\n## Page 1\nScene: Mia finds tracks in the snow.\n",
    );
    assert_eq!(outline.extract_title().as_deref(), Some("Mia and the Snow Fox"));
}

#[test]
fn test_title_heading_beats_earlier_plain_line() {
    let outline = Outline::new(
        "# Outline\nA winter story for Mia.\n\n## Titel\nMia und der Schneefuchs\n\n## Seite 1\nSzene: Schnee.\n",
    );
    assert_eq!(outline.extract_title().as_deref(), Some("Mia und der Schneefuchs"));
}

#[test]
fn test_labels_after_heading_are_not_titles() {
    let outline = Outline::new(
        "# Story Outline\n\nPrimary Clothing: winter\n\n## Page 1\nScene: Mia in the snow.\n",
    );
    assert_eq!(outline.extract_title(), None);
}

#[test]
fn test_missing_title_is_none() {
    for text in [
        "",
        "## Page 1\nScene: Mia looks at the moon through the window.",
        "Just some prose without any structure at all.",
        "---TITLE PAGE---\nSetting: a park",
    ] {
        assert_eq!(Outline::new(text).extract_title(), None, "text: {text:?}");
    }
}

#[test]
fn test_clothing_map_with_same_carries_forward() {
    let outline = Outline::new(WINTER_OUTLINE);
    let plan = outline.extract_clothing_map(6);

    assert_eq!(plan.primary, ClothingCategory::Standard);
    let pages: Vec<ClothingCategory> = plan.per_page.values().copied().collect();
    assert_eq!(
        pages,
        vec![
            ClothingCategory::Standard,
            ClothingCategory::Standard,
            ClothingCategory::Winter,
            ClothingCategory::Winter,
            ClothingCategory::Winter,
            ClothingCategory::Summer,
        ]
    );
}

#[test]
fn test_every_page_has_a_category() {
    let outline = Outline::new(WINTER_OUTLINE);
    for total in [0, 1, 5, 12] {
        let plan = outline.extract_clothing_map(total);
        assert_eq!(plan.per_page.len(), total as usize);
        assert!(plan.per_page.keys().copied().eq(1..=total));
    }
}

#[test]
fn test_scene_hints_per_page() {
    let outline = Outline::new(WINTER_OUTLINE);
    let hints = outline.extract_scene_hints();

    assert_eq!(hints.len(), 6);
    assert_eq!(hints[&1], "Mia wakes up and looks out at a quiet street.");
    assert_eq!(hints[&3], "Mia and Leo step into the deep snow.");
}

#[test]
fn test_cover_scenes_from_delimiter_blocks() {
    let outline = Outline::new(WINTER_OUTLINE);
    let covers = outline.extract_cover_scenes();

    assert_eq!(
        covers.title_page.scene,
        "Setting: a snowy hill at dusk\nCharacters: Mia and Leo\nAction: sledding towards the reader"
    );
    assert_eq!(covers.title_page.clothing, Some(ClothingCategory::Winter));
    assert_eq!(
        covers.initial_page.scene,
        "Mia's window with frost flowers and a small fox footprint on the sill."
    );
    assert_eq!(
        covers.back_cover.scene,
        "Setting: the garden under stars\nMood: sleepy and warm"
    );
}

#[test]
fn test_cover_blocks_do_not_leak_into_pages() {
    let text = "## Page 1\nScene: Mia feeds the ducks at the pond.\n---BACK COVER---\nThe ducks sleep on the quiet pond.";
    let outline = Outline::new(text);
    assert_eq!(
        outline.extract_scene_hints()[&1],
        "Mia feeds the ducks at the pond."
    );
    assert_eq!(
        outline.extract_cover_scenes().back_cover.scene,
        "The ducks sleep on the quiet pond."
    );
}

#[test]
fn test_german_outline() {
    let text = r#"
## Titel
Mia und der Schneefuchs

Hauptkleidung: Sommer

**Titelseite:** Mia und Leo liegen im Gras
und schauen in den Himmel.

## Seite 1
Szene: Mia pflückt Blumen auf der Wiese.

## Seite 2
Szene: Ein Gewitter zieht auf und alle laufen heim.
Kleidung: Winterkleidung

## Seite 3
Szene: Am Kamin trinken alle heißen Kakao.
Kleidung: gleich
"#;
    let outline = Outline::new(text);

    assert_eq!(outline.extract_title().as_deref(), Some("Mia und der Schneefuchs"));
    let plan = outline.extract_clothing_map(3);
    assert_eq!(plan.primary, ClothingCategory::Summer);
    assert_eq!(plan.for_page(1), ClothingCategory::Summer);
    assert_eq!(plan.for_page(2), ClothingCategory::Winter);
    assert_eq!(plan.for_page(3), ClothingCategory::Winter);
    assert_eq!(
        outline.extract_cover_scenes().title_page.scene,
        "Mia und Leo liegen im Gras und schauen in den Himmel."
    );
    assert_eq!(
        outline.extract_scene_hints()[&1],
        "Mia pflückt Blumen auf der Wiese."
    );
}

#[test]
fn test_french_outline() {
    let text = r#"
Titre : Le Renard des Neiges

**Page de titre :** Mia et Léo font de la luge sur la colline.
Tenue : hiver

## Page 1
Scène : Mia regarde la neige tomber par la fenêtre.

## Page 2
Scène : Mia et Léo se préparent pour un mariage.
Tenue : habillée
"#;
    let outline = Outline::new(text);

    assert_eq!(outline.extract_title().as_deref(), Some("Le Renard des Neiges"));
    let covers = outline.extract_cover_scenes();
    assert_eq!(
        covers.title_page.scene,
        "Mia et Léo font de la luge sur la colline."
    );
    assert_eq!(covers.title_page.clothing, Some(ClothingCategory::Winter));
    assert_eq!(
        outline.extract_clothing_map(2).for_page(2),
        ClothingCategory::Formal
    );
}

#[test]
fn test_validate_page_order() {
    let ordered = Outline::new("## Page 1\nA\n## Page 2\nB\n");
    assert!(ordered.validate_page_order().is_ok());

    let swapped = Outline::new("## Page 2\nA\n## Page 1\nB\n");
    let err = swapped.validate_page_order().unwrap_err();
    assert!(matches!(
        err.kind(),
        PicturebookErrorKind::Outline(e) if matches!(e.kind, OutlineErrorKind::OutOfOrder { page: 1, previous: 2, .. })
    ));

    let duplicate = Outline::new("## Page 1\nA\n## Page 1\nB\n");
    let err = duplicate.validate_page_order().unwrap_err();
    assert!(matches!(
        err.kind(),
        PicturebookErrorKind::Outline(e) if e.kind == OutlineErrorKind::Duplicate(1)
    ));

    assert!(Outline::new("no pages here").validate_page_order().is_err());
}

#[test]
fn test_duplicate_page_keeps_first_slice() {
    let outline = Outline::new(
        "## Page 1\nScene: The first version of page one.\n## Page 1\nScene: A second, conflicting page one.\n",
    );
    let slices = outline.page_slices();
    assert_eq!(slices.len(), 1);
    assert_eq!(
        outline.extract_scene_hints()[&1],
        "The first version of page one."
    );
}
