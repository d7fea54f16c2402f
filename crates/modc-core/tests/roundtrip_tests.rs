// Reverse, build, audit and backup over real temp directories.
use std::fs;
use std::path::{Path, PathBuf};

use modc_core::{
    BuildOptions, Builder, CONFIG_FILE, Error, OUTPUT_FILE, ReverseOptions, Reverser,
};
use serde_json::{Value, json};

fn sample_save() -> Value {
    json!({
        "SaveName": "Dungeon Night",
        "Date": "10/19/2026 8:00:00 PM",
        "VersionNumber": "v13.2.2",
        "GameMode": "Dungeon Night",
        "GameType": "",
        "GameComplexity": "",
        "Table": "Table_RPG",
        "Sky": "Sky_Museum",
        "Note": "",
        "TabStates": {"0": {"title": "Rules", "body": "", "color": "Grey", "id": 0}},
        "MusicPlayer": {"RepeatSong": false, "PlaylistEntry": -1},
        "Grid": {"Type": 0, "Lines": false, "xSize": 2.0, "ySize": 2.0},
        "Lighting": {"LightIntensity": 0.54, "LutIndex": 0},
        "Hands": {"Enable": true, "HandTransforms": []},
        "ComponentTags": {"labels": []},
        "Turns": {"Enable": false, "Type": 0, "TurnOrder": []},
        "CameraStates": [null, {"Position": {"x": 0.0, "y": 30.5, "z": -10.25}}],
        "DecalPallet": [],
        "CustomUIAssets": [{"Name": "logo", "URL": "http://example.invalid/logo.png"}],
        "SnapPoints": [{"Position": {"x": 1.0, "y": 1.0, "z": 1.0}}],
        "Decals": [],
        "LuaScript": "function onLoad()\n  print('loaded')\nend\n",
        "LuaScriptState": "{\"round\":3}",
        "XmlUI": "<Panel id=\"hud\"/>",
        "ObjectStates": [
            {
                "Name": "Bag",
                "Nickname": "Loot",
                "GUID": "a1b2c3",
                "Transform": {"posX": 1.5, "posY": 1.0, "posZ": -2.0},
                "LuaScript": "-- loot bag",
                "ObjectStates": [
                    {"Name": "Die_6", "Nickname": "Die", "GUID": "d10001", "LuaScript": "roll()"},
                    {"Name": "Die_6", "Nickname": "Die", "GUID": "d10002", "XmlUI": "<Text>2</Text>\n\n"}
                ]
            },
            {"Name": "Card", "GUID": "c00001", "LuaScriptState": "state\n"},
            {"Name": "Figurine", "Nickname": "Hero: Red/Blue", "GUID": "f00001", "LuaScript": "move()"}
        ]
    })
}

fn reverse_into(root: &Path, doc: &Value) -> Value {
    Reverser::new(root, ReverseOptions::default())
        .reverse_to_root(doc)
        .expect("reverse")
}

#[test]
fn reverse_then_build_is_deep_equal() {
    let dir = tempfile::tempdir().unwrap();
    let want = sample_save();
    reverse_into(dir.path(), &want);
    let got = Builder::new(dir.path(), BuildOptions::default())
        .build_to_root()
        .expect("build");
    assert_eq!(want, got);
    let persisted = modc_core::read_json_file(&dir.path().join(OUTPUT_FILE)).unwrap();
    assert_eq!(want, persisted);
}

#[test]
fn reverse_writes_mirrored_tree_and_references() {
    let dir = tempfile::tempdir().unwrap();
    let skeleton = reverse_into(dir.path(), &sample_save());
    let root = dir.path();

    assert_eq!(skeleton["LuaScript_path"], json!("script.lua"));
    assert!(skeleton.get("LuaScript").is_none());
    assert_eq!(skeleton["TabStates"], sample_save()["TabStates"]);

    let bag = &skeleton["ObjectStates"][0];
    assert_eq!(bag["LuaScript_path"], json!("Loot/script.lua"));
    assert_eq!(bag["ObjectStates"][0]["LuaScript_path"], json!("Loot/Die/script.lua"));
    assert_eq!(bag["ObjectStates"][1]["XmlUI_path"], json!("Loot/Die_1/ui.xml"));
    assert_eq!(bag["ObjectStates"][1]["GUID"], json!("d10002"));
    assert_eq!(skeleton["ObjectStates"][1]["LuaScriptState_path"], json!("Card/script_state.txt"));

    assert!(root.join(CONFIG_FILE).is_file());
    assert_eq!(fs::read_to_string(root.join("Loot/Die/script.lua")).unwrap(), "roll()\n");
    assert_eq!(
        fs::read_to_string(root.join("Loot/Die_1/ui.xml")).unwrap(),
        "<Text>2</Text>\n\n\n"
    );
    assert!(root.join("Loot/Die_1").is_dir());
    assert!(!root.join("Loot/Die_1/script.lua").exists());
}

#[test]
fn duplicate_names_keep_order_through_build() {
    let dir = tempfile::tempdir().unwrap();
    let doc = json!({
        "SaveName": "dupes",
        "ObjectStates": [
            {"Nickname": "Die", "GUID": "1", "LuaScript": "one"},
            {"Nickname": "Die", "GUID": "2", "LuaScript": "two"},
            {"Nickname": "Die", "GUID": "3", "LuaScript": "three"}
        ]
    });
    reverse_into(dir.path(), &doc);
    for (name, body) in [("Die", "one"), ("Die_1", "two"), ("Die_2", "three")] {
        let p = dir.path().join(name).join("script.lua");
        assert_eq!(fs::read_to_string(p).unwrap(), format!("{}\n", body));
    }
    let got = Builder::new(dir.path(), BuildOptions::default())
        .build_from_root()
        .unwrap();
    let guids: Vec<&str> = got["ObjectStates"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["GUID"].as_str().unwrap())
        .collect();
    assert_eq!(guids, ["1", "2", "3"]);
    assert_eq!(got, doc);
}

#[test]
fn illegal_name_hint_is_sanitized() {
    let dir = tempfile::tempdir().unwrap();
    let skeleton = reverse_into(dir.path(), &sample_save());
    assert_eq!(
        skeleton["ObjectStates"][2]["LuaScript_path"],
        json!("Hero_ Red_Blue/script.lua")
    );
    assert!(dir.path().join("Hero_ Red_Blue/script.lua").is_file());
}

#[test]
fn unnamed_objects_fall_back_to_default_dir_name() {
    let dir = tempfile::tempdir().unwrap();
    let doc = json!({"ObjectStates": [
        {"Nickname": "", "Name": "..", "LuaScript": "a"},
        {"LuaScript": "b"}
    ]});
    let skeleton = reverse_into(dir.path(), &doc);
    assert_eq!(skeleton["ObjectStates"][0]["LuaScript_path"], json!("Object/script.lua"));
    assert_eq!(skeleton["ObjectStates"][1]["LuaScript_path"], json!("Object_1/script.lua"));
}

#[test]
fn empty_fields_are_dropped_without_files() {
    let dir = tempfile::tempdir().unwrap();
    let doc = json!({
        "SaveName": "empty",
        "LuaScript": "",
        "ObjectStates": [{"Name": "Block", "LuaScript": "", "XmlUI": "", "LuaScriptState": "s"}]
    });
    let skeleton = reverse_into(dir.path(), &doc);
    assert!(skeleton.get("LuaScript").is_none());
    assert!(skeleton.get("LuaScript_path").is_none());
    let block = &skeleton["ObjectStates"][0];
    assert!(block.get("LuaScript").is_none());
    assert!(block.get("XmlUI_path").is_none());
    assert!(!dir.path().join("script.lua").exists());
    assert!(!dir.path().join("Block/script.lua").exists());
    assert!(!dir.path().join("Block/ui.xml").exists());

    let got = Builder::new(dir.path(), BuildOptions::default())
        .build_from_root()
        .unwrap();
    assert!(got.get("LuaScript").is_none());
    assert_eq!(got["ObjectStates"][0]["LuaScriptState"], json!("s"));
    assert!(got["ObjectStates"][0].get("XmlUI").is_none());
}

#[test]
fn keep_empty_round_trips_empty_fields() {
    let dir = tempfile::tempdir().unwrap();
    let doc = json!({
        "LuaScript": "",
        "ObjectStates": [{"Name": "Block", "LuaScript": "", "XmlUI": "<X/>"}]
    });
    let skeleton = Reverser::new(dir.path(), ReverseOptions { keep_empty: true })
        .reverse_to_root(&doc)
        .unwrap();
    assert_eq!(skeleton["LuaScript"], json!(""));
    assert!(!dir.path().join("Block/script.lua").exists());
    let got = Builder::new(dir.path(), BuildOptions::default())
        .build_from_root()
        .unwrap();
    assert_eq!(got, doc);
}

#[test]
fn missing_asset_aborts_build_without_output() {
    let dir = tempfile::tempdir().unwrap();
    reverse_into(dir.path(), &sample_save());
    fs::remove_file(dir.path().join("Loot/Die/script.lua")).unwrap();
    let err = Builder::new(dir.path(), BuildOptions::default())
        .build_to_root()
        .unwrap_err();
    match err {
        Error::NotFound { name } => assert_eq!(name, PathBuf::from("Loot/Die/script.lua")),
        other => panic!("expected NotFound, got {:?}", other),
    }
    assert!(!dir.path().join(OUTPUT_FILE).exists());
}

#[test]
fn build_falls_back_to_extra_read_roots() {
    let dir = tempfile::tempdir().unwrap();
    let shared = tempfile::tempdir().unwrap();
    fs::create_dir_all(shared.path().join("lib")).unwrap();
    fs::write(shared.path().join("lib/script.lua"), "shared()\n").unwrap();
    let skeleton = json!({"ObjectStates": [{"Name": "A", "LuaScript_path": "lib/script.lua"}]});
    let got = Builder::new(
        dir.path(),
        BuildOptions {
            extra_read_roots: vec![shared.path().to_path_buf()],
        },
    )
    .build(&skeleton)
    .unwrap();
    assert_eq!(got["ObjectStates"][0]["LuaScript"], json!("shared()"));
}

#[test]
fn malformed_references_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let builder = Builder::new(dir.path(), BuildOptions::default());
    for skeleton in [
        json!({"LuaScript_path": 7}),
        json!({"LuaScript_path": "../outside.lua"}),
        json!({"LuaScript_path": "/etc/passwd"}),
        json!({"LuaScript_path": "script.lua", "LuaScript": "inline"}),
        json!({"ObjectStates": {"not": "an array"}}),
        json!({"ObjectStates": ["not an object"]}),
        json!([1, 2, 3]),
    ] {
        assert!(
            matches!(builder.build(&skeleton), Err(Error::MalformedSkeleton { .. })),
            "{} should be rejected",
            skeleton
        );
    }
}

#[test]
fn malformed_documents_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let reverser = Reverser::new(dir.path(), ReverseOptions::default());
    for doc in [
        json!("just a string"),
        json!({"ObjectStates": 3}),
        json!({"ObjectStates": [[]]}),
        json!({"LuaScript_path": "script.lua"}),
    ] {
        assert!(
            matches!(reverser.reverse(&doc), Err(Error::MalformedDocument { .. })),
            "{} should be rejected",
            doc
        );
    }
}

#[test]
fn failed_asset_write_leaves_no_config() {
    let dir = tempfile::tempdir().unwrap();
    // A directory squatting on the root script's file name makes the write fail.
    fs::create_dir_all(dir.path().join("script.lua")).unwrap();
    let err = Reverser::new(dir.path(), ReverseOptions::default())
        .reverse_to_root(&json!({"LuaScript": "print(1)"}))
        .unwrap_err();
    assert!(matches!(err, Error::Storage { .. }), "{:?}", err);
    assert!(!dir.path().join(CONFIG_FILE).exists());
}

#[test]
fn non_string_payloads_are_copied_verbatim() {
    let dir = tempfile::tempdir().unwrap();
    let doc = json!({"LuaScript": null, "ObjectStates": [{"Name": "A", "XmlUI": 42}]});
    let skeleton = reverse_into(dir.path(), &doc);
    assert_eq!(skeleton, doc);
    let got = Builder::new(dir.path(), BuildOptions::default())
        .build_from_root()
        .unwrap();
    assert_eq!(got, doc);
}

#[test]
fn audit_reports_orphaned_and_dangling_assets() {
    let dir = tempfile::tempdir().unwrap();
    reverse_into(dir.path(), &sample_save());
    let report = modc_core::audit_root(dir.path()).unwrap();
    assert!(report.is_clean(), "{:?}", report);
    assert_eq!(report.referenced, 8);

    fs::create_dir_all(dir.path().join("Stray")).unwrap();
    fs::write(dir.path().join("Stray/script.lua"), "lost()\n").unwrap();
    fs::remove_file(dir.path().join("Card/script_state.txt")).unwrap();
    let report = modc_core::audit_root(dir.path()).unwrap();
    assert_eq!(report.orphaned, vec![PathBuf::from("Stray/script.lua")]);
    assert_eq!(report.dangling, vec![PathBuf::from("Card/script_state.txt")]);
    assert!(report.shared.is_empty());
}

#[test]
fn audit_reports_shared_references() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("script.lua"), "x\n").unwrap();
    let skeleton = json!({
        "LuaScript_path": "script.lua",
        "ObjectStates": [{"Name": "A", "LuaScript_path": "script.lua"}]
    });
    modc_core::write_json_file(&dir.path().join(CONFIG_FILE), &skeleton).unwrap();
    let report = modc_core::audit_root(dir.path()).unwrap();
    assert_eq!(report.shared, vec![PathBuf::from("script.lua")]);
    assert_eq!(report.referenced, 1);
}

#[test]
fn backup_zips_and_replaces_tree() {
    let parent = tempfile::tempdir().unwrap();
    let root = parent.path().join("mod");
    assert!(modc_core::is_fresh_root(&root).unwrap());
    reverse_into(&root, &sample_save());
    assert!(!modc_core::is_fresh_root(&root).unwrap());

    let zip = modc_core::zip_backup_tree(&root).unwrap();
    assert!(zip.is_file());
    assert_eq!(zip.parent(), Some(fs::canonicalize(parent.path()).unwrap().as_path()));
    assert!(root.join(CONFIG_FILE).is_file());

    fs::remove_file(&zip).unwrap();
    let zip = modc_core::replace_with_backup(&root).unwrap().expect("archive");
    assert!(zip.is_file());
    assert!(!root.exists());
    assert_eq!(modc_core::replace_with_backup(&root).unwrap(), None);
}

#[test]
fn objects_named_like_fixed_files_get_suffixed_folders() {
    let dir = tempfile::tempdir().unwrap();
    // ObjectStates ahead of the root payloads, as real saves order them.
    let doc: Value = serde_json::from_str(
        r#"{
            "ObjectStates": [
                {"Nickname": "config.json", "LuaScript": "a"},
                {"Nickname": "script.lua", "XmlUI": "<X/>"},
                {"Nickname": "UI.XML"},
                {"Nickname": "output.json", "LuaScriptState": "s"}
            ],
            "LuaScript": "x",
            "XmlUI": "<Root/>"
        }"#,
    )
    .unwrap();
    let skeleton = reverse_into(dir.path(), &doc);
    assert_eq!(skeleton["ObjectStates"][0]["LuaScript_path"], json!("config.json_1/script.lua"));
    assert_eq!(skeleton["ObjectStates"][1]["XmlUI_path"], json!("script.lua_1/ui.xml"));
    assert!(dir.path().join("UI.XML_1").is_dir());
    assert_eq!(
        skeleton["ObjectStates"][3]["LuaScriptState_path"],
        json!("output.json_1/script_state.txt")
    );
    assert!(dir.path().join(CONFIG_FILE).is_file());
    assert!(dir.path().join("script.lua").is_file());

    let got = Builder::new(dir.path(), BuildOptions::default())
        .build_to_root()
        .unwrap();
    assert_eq!(got, doc);
    assert!(dir.path().join(OUTPUT_FILE).is_file());
}

#[test]
fn very_long_names_are_truncated_and_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let long = "N".repeat(300);
    let doc = json!({"ObjectStates": [
        {"Nickname": long, "LuaScript": "a"},
        {"Nickname": long, "LuaScript": "b"}
    ]});
    let skeleton = reverse_into(dir.path(), &doc);
    let short = "N".repeat(modc_core::dirs::MAX_SEGMENT_BYTES);
    assert_eq!(
        skeleton["ObjectStates"][0]["LuaScript_path"],
        json!(format!("{}/script.lua", short))
    );
    assert_eq!(
        skeleton["ObjectStates"][1]["LuaScript_path"],
        json!(format!("{}_1/script.lua", short))
    );
    let got = Builder::new(dir.path(), BuildOptions::default())
        .build_from_root()
        .unwrap();
    assert_eq!(got, doc);
}

#[test]
fn backup_of_relative_path_lands_beside_the_tree() {
    let parent = tempfile::tempdir().unwrap();
    let root = parent.path().join("mod");
    reverse_into(&root, &sample_save());
    // `Loot/..` names the tree itself but has no file name of its own.
    let indirect = root.join("Loot").join("..");
    assert!(indirect.file_name().is_none());

    let zip = modc_core::replace_with_backup(&indirect).unwrap().expect("archive");
    assert_eq!(zip.parent(), Some(fs::canonicalize(parent.path()).unwrap().as_path()));
    let zip_name = zip.file_name().unwrap().to_str().unwrap();
    assert!(zip_name.starts_with("mod_") && zip_name.ends_with(".zip"), "{}", zip_name);
    assert!(zip.is_file());
    assert!(!root.exists());
}
