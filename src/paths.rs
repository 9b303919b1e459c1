//! Candidate path catalog
//!
//! Every place a semantic field may live in a metadata tree, in priority
//! order. Earlier entries are more authoritative. Extractors reference these
//! lists instead of probing keys directly.

use crate::tree::CandidatePath;

// ---- WHEN ----

/// Capture timestamp written by the camera itself
pub const CAPTURE_DATE: &[CandidatePath<'static>] = &[
    &["exif", "DateTimeOriginal"],
    &["exif", "CreateDate"],
    &["exif", "DateTimeDigitized"],
    &["EXIF", "DateTimeOriginal"],
    &["EXIF:DateTimeOriginal"],
    &["DateTimeOriginal"],
    &["quicktime", "CreateDate"],
    &["QuickTime:CreateDate"],
    &["xmp", "DateCreated"],
];

/// Last-edit timestamps recorded inside the metadata
pub const EDIT_DATE: &[CandidatePath<'static>] = &[
    &["exif", "ModifyDate"],
    &["exif", "DateTime"],
    &["xmp", "ModifyDate"],
];

/// File creation time as reported by the filesystem
pub const FILESYSTEM_CREATED: &[CandidatePath<'static>] = &[
    &["filesystem", "created"],
    &["filesystem", "birthtime"],
    &["filesystem", "FileCreateDate"],
    &["file", "FileCreateDate"],
    &["File:FileCreateDate"],
];

pub const FILESYSTEM_MODIFIED: &[CandidatePath<'static>] = &[
    &["filesystem", "modified"],
    &["filesystem", "mtime"],
    &["file", "FileModifyDate"],
    &["File:FileModifyDate"],
];

// ---- WHERE ----

pub const LATITUDE: &[CandidatePath<'static>] = &[
    &["gps", "latitude"],
    &["gps", "Latitude"],
    &["gps", "GPSLatitude"],
    &["exif", "GPSLatitude"],
    &["EXIF:GPSLatitude"],
    &["composite", "GPSLatitude"],
    &["Composite:GPSLatitude"],
    &["location", "latitude"],
    &["location", "lat"],
];

pub const LONGITUDE: &[CandidatePath<'static>] = &[
    &["gps", "longitude"],
    &["gps", "Longitude"],
    &["gps", "GPSLongitude"],
    &["exif", "GPSLongitude"],
    &["EXIF:GPSLongitude"],
    &["composite", "GPSLongitude"],
    &["Composite:GPSLongitude"],
    &["location", "longitude"],
    &["location", "lng"],
];

pub const LATITUDE_REF: &[CandidatePath<'static>] = &[
    &["gps", "GPSLatitudeRef"],
    &["gps", "latitudeRef"],
    &["exif", "GPSLatitudeRef"],
    &["EXIF:GPSLatitudeRef"],
];

pub const LONGITUDE_REF: &[CandidatePath<'static>] = &[
    &["gps", "GPSLongitudeRef"],
    &["gps", "longitudeRef"],
    &["exif", "GPSLongitudeRef"],
    &["EXIF:GPSLongitudeRef"],
];

// ---- DEVICE ----

pub const MAKE: &[CandidatePath<'static>] = &[
    &["exif", "Make"],
    &["EXIF", "Make"],
    &["EXIF:Make"],
    &["tiff", "Make"],
    &["device", "make"],
    &["device", "manufacturer"],
    &["quicktime", "Make"],
    &["android", "manufacturer"],
    &["Make"],
];

pub const MODEL: &[CandidatePath<'static>] = &[
    &["exif", "Model"],
    &["EXIF", "Model"],
    &["EXIF:Model"],
    &["tiff", "Model"],
    &["device", "model"],
    &["quicktime", "Model"],
    &["android", "model"],
    &["Model"],
];

// ---- AUTHENTICITY ----

pub const MANIPULATION_DETECTED: &[CandidatePath<'static>] = &[
    &["forensics", "manipulationDetected"],
    &["forensics", "manipulation_detected"],
    &["forensic", "manipulationDetected"],
    &["analysis", "manipulationDetected"],
    &["manipulationDetected"],
];

pub const AI_GENERATED: &[CandidatePath<'static>] = &[
    &["forensics", "aiGenerated"],
    &["forensics", "ai_generated"],
    &["forensic", "aiGenerated"],
    &["analysis", "aiGenerated"],
    &["aiGenerated"],
];

pub const THUMBNAIL: &[CandidatePath<'static>] = &[
    &["thumbnail"],
    &["exif", "ThumbnailImage"],
    &["exif", "ThumbnailOffset"],
    &["exif", "thumbnail"],
    &["EXIF:ThumbnailImage"],
    &["EXIF:ThumbnailOffset"],
    &["embedded", "thumbnail"],
    &["forensics", "hasThumbnail"],
];

/// Group whose key count decides whether EXIF is "present"
pub const EXIF_GROUPS: &[CandidatePath<'static>] = &[&["exif"], &["EXIF"]];

/// Root-level key prefix of flat exiftool output (`EXIF:Make`)
pub const EXIF_KEY_PREFIX: &str = "EXIF:";
