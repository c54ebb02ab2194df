//! Name derivation for scene objects and images

/// Prefix of the combined lightmap image name
pub const COMBINED_IMAGE_PREFIX: &str = "lightmap_";

/// Characters of the object name kept by [`combined_image_name`]
pub const COMBINED_NAME_CHARS: usize = 8;

/// `lightmap_` + the first 8 characters of `object_name`
///
/// Two objects sharing an 8-character prefix derive the same name.
pub fn combined_image_name(object_name: &str) -> String {
    let prefix: String = object_name.chars().take(COMBINED_NAME_CHARS).collect();
    format!("{COMBINED_IMAGE_PREFIX}{prefix}")
}

/// Name for a duplicated object: `<base>_mapped`, then `<base>_mapped_1`, ...
pub fn mapped_name(base: &str, exists: impl Fn(&str) -> bool) -> String {
    let mut name = format!("{base}_mapped");
    let mut counter = 1;
    while exists(&name) {
        name = format!("{base}_mapped_{counter}");
        counter += 1;
    }
    name
}

/// Make `name` unique by appending `.001`, `.002`, ...
pub fn dedup_name(name: &str, exists: impl Fn(&str) -> bool) -> String {
    if !exists(name) {
        return name.to_string();
    }
    let mut counter = 1;
    loop {
        let candidate = format!("{name}.{counter:03}");
        if !exists(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Reduce a mesh or object name to a file name component
///
/// ASCII letters, digits, `-` and `_` are kept; anything else, path
/// separators included, becomes `_`.
pub fn file_name_part(name: &str) -> String {
    let part: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if part.is_empty() {
        "mesh".to_string()
    } else {
        part
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combined_name_truncates_to_eight_chars() {
        assert_eq!(combined_image_name("Courtyard_Walls"), "lightmap_Courtyar");
        assert_eq!(combined_image_name("Box"), "lightmap_Box");
    }

    #[test]
    fn test_combined_name_counts_chars_not_bytes() {
        assert_eq!(combined_image_name("Würfel_Ost_1"), "lightmap_Würfel_O");
    }

    #[test]
    fn test_combined_name_prefix_collision() {
        assert_eq!(
            combined_image_name("Castle_Keep_North"),
            combined_image_name("Castle_Keep_South")
        );
    }

    #[test]
    fn test_mapped_name_counts_up() {
        let taken = ["Cube_mapped", "Cube_mapped_1"];
        assert_eq!(mapped_name("Cube", |n| taken.contains(&n)), "Cube_mapped_2");
        assert_eq!(mapped_name("Cone", |n| taken.contains(&n)), "Cone_mapped");
    }

    #[test]
    fn test_dedup_name() {
        let taken = ["Image", "Image.001"];
        assert_eq!(dedup_name("Image", |n| taken.contains(&n)), "Image.002");
        assert_eq!(dedup_name("Other", |n| taken.contains(&n)), "Other");
    }

    #[test]
    fn test_file_name_part() {
        assert_eq!(file_name_part("Rock_01"), "Rock_01");
        assert_eq!(file_name_part("../walls/north"), "___walls_north");
        assert_eq!(file_name_part("C:\\tmp"), "C__tmp");
        assert_eq!(file_name_part("Würfel"), "W_rfel");
        assert_eq!(file_name_part(""), "mesh");
    }
}
