/// Remove redundant segments from a path string.
///
/// Collapses repeated `/`, drops `.` segments and resolves `..` against the
/// segment before it. An absolute path never climbs above `/`; a relative
/// path keeps the leading `..` segments it cannot resolve. The trailing
/// separator is stripped except for the root itself.
///
/// Symbolic links are not consulted; this is purely lexical.
///
/// ```
/// use strata_path::clean_path;
///
/// assert_eq!(clean_path("./local"), "local");
/// assert_eq!(clean_path("local/../bin"), "bin");
/// assert_eq!(clean_path("/local/usr/../bin"), "/local/bin");
/// assert_eq!(clean_path("/.."), "/");
/// ```
pub fn clean_path(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }

    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                // At root, stay at root
                _ if absolute => {}
                _ => segments.push(".."),
            },
            name => segments.push(name),
        }
    }

    let joined = segments.join("/");
    if absolute {
        let mut out = String::with_capacity(joined.len() + 1);
        out.push('/');
        out.push_str(&joined);
        out
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stays_empty() {
        assert_eq!(clean_path(""), "");
    }

    #[test]
    fn test_collapse_separators() {
        assert_eq!(clean_path("//usr///lib//"), "/usr/lib");
        assert_eq!(clean_path("/"), "/");
        assert_eq!(clean_path("///"), "/");
    }

    #[test]
    fn test_dot_segments() {
        assert_eq!(clean_path("./local"), "local");
        assert_eq!(clean_path("/a/./b/."), "/a/b");
        assert_eq!(clean_path("."), ".");
        assert_eq!(clean_path("./"), ".");
    }

    #[test]
    fn test_dot_dot_segments() {
        assert_eq!(clean_path("local/../bin"), "bin");
        assert_eq!(clean_path("/local/usr/../bin"), "/local/bin");
        assert_eq!(clean_path("/a/b/../../c"), "/c");
        assert_eq!(clean_path("a/.."), ".");
    }

    #[test]
    fn test_absolute_never_climbs_above_root() {
        assert_eq!(clean_path("/.."), "/");
        assert_eq!(clean_path("/../../etc"), "/etc");
    }

    #[test]
    fn test_relative_keeps_leading_dot_dot() {
        assert_eq!(clean_path("../a"), "../a");
        assert_eq!(clean_path("../a/../../b"), "../../b");
        assert_eq!(clean_path("a/../../b"), "../b");
    }

    #[test]
    fn test_dotted_names_are_not_special() {
        assert_eq!(clean_path("/a/...b/.c"), "/a/...b/.c");
        assert_eq!(clean_path("/a/.../x"), "/a/.../x");
    }

    #[test]
    fn test_idempotent() {
        for p in [
            "/a//b/../c/./d/",
            "../x/./../../y",
            "icons:/app/../logo.png",
            "/",
            ".",
            "a",
        ] {
            let once = clean_path(p);
            assert_eq!(clean_path(&once), once, "not a fixed point for {p}");
        }
    }
}
