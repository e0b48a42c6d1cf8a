/// Hard limit imposed by MCP clients on tool name length.
pub const MAX_TOOL_NAME_LEN: usize = 64;

/// Segment abbreviations keeping the longest derived names within
/// [`MAX_TOOL_NAME_LEN`]. Applied to whole path segments and whole path
/// parameter names only, never to substrings.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("merge_request_iid", "mr_iid"),
    ("merge_requests", "mrs"),
    ("projects", "pjs"),
];

fn abbreviate(segment: &str) -> &str {
    for (full, short) in ABBREVIATIONS {
        if segment == *full {
            return short;
        }
    }
    segment
}

/// Derives the tool name for an endpoint: the lowercased HTTP method
/// followed by every path segment joined with `_`, where `{param}`
/// segments contribute the parameter name.
///
/// `GET /projects/{id}/issues` becomes `get_pjs_id_issues`.
pub fn tool_name(method: &str, path: &str) -> String {
    let mut parts = vec![method.to_ascii_lowercase()];
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        let key = segment
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .unwrap_or(segment);
        parts.push(abbreviate(key).to_string());
    }
    parts.join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_collection_path() {
        assert_eq!(tool_name("GET", "/projects"), "get_pjs");
        assert_eq!(tool_name("POST", "/projects"), "post_pjs");
    }

    #[test]
    fn test_path_parameters_contribute_their_name() {
        assert_eq!(tool_name("GET", "/projects/{id}/issues"), "get_pjs_id_issues");
        assert_eq!(
            tool_name("GET", "/projects/{id}/issues/{issue_iid}"),
            "get_pjs_id_issues_issue_iid"
        );
    }

    #[test]
    fn test_action_suffix() {
        assert_eq!(
            tool_name("POST", "/projects/{id}/issues/{issue_iid}/clone"),
            "post_pjs_id_issues_issue_iid_clone"
        );
    }

    #[test]
    fn test_merge_request_abbreviations() {
        assert_eq!(tool_name("GET", "/merge_requests"), "get_mrs");
        assert_eq!(
            tool_name("GET", "/projects/{id}/merge_requests/{merge_request_iid}"),
            "get_pjs_id_mrs_mr_iid"
        );
    }

    #[test]
    fn test_abbreviation_applies_to_whole_segments_only() {
        // "related_merge_requests" is one segment and must stay intact.
        assert_eq!(
            tool_name(
                "GET",
                "/projects/{id}/issues/{issue_iid}/related_merge_requests"
            ),
            "get_pjs_id_issues_issue_iid_related_merge_requests"
        );
    }

    #[test]
    fn test_abbreviation_applies_to_nested_literal_segments() {
        assert_eq!(
            tool_name("GET", "/projects/{id}/milestones/{milestone_id}/merge_requests"),
            "get_pjs_id_milestones_milestone_id_mrs"
        );
        assert_eq!(
            tool_name("GET", "/users/{user_id}/projects"),
            "get_users_user_id_pjs"
        );
    }

    #[test]
    fn test_method_is_lowercased() {
        assert_eq!(tool_name("DELETE", "/projects/{id}"), "delete_pjs_id");
        assert_eq!(tool_name("delete", "/projects/{id}"), "delete_pjs_id");
    }

    #[test]
    fn test_global_and_singleton_paths() {
        assert_eq!(tool_name("GET", "/issues"), "get_issues");
        assert_eq!(tool_name("GET", "/user"), "get_user");
        assert_eq!(tool_name("GET", "/search"), "get_search");
    }

    #[test]
    fn test_longest_catalog_name_is_exactly_the_limit() {
        let name = tool_name(
            "DELETE",
            "/projects/{id}/merge_requests/{merge_request_iid}/discussions/{discussion_id}/notes/{note_id}",
        );
        assert_eq!(
            name,
            "delete_pjs_id_mrs_mr_iid_discussions_discussion_id_notes_note_id"
        );
        assert_eq!(name.len(), MAX_TOOL_NAME_LEN);
    }

    #[test]
    fn test_without_abbreviations_the_longest_name_would_overflow() {
        // Sanity check on why the abbreviation table exists at all.
        let unabbreviated = "delete_projects_id_merge_requests_merge_request_iid_discussions_discussion_id_notes_note_id";
        assert!(unabbreviated.len() > MAX_TOOL_NAME_LEN);
    }

    #[test]
    fn test_empty_and_duplicate_slashes_are_ignored() {
        assert_eq!(tool_name("GET", "projects"), "get_pjs");
        assert_eq!(tool_name("GET", "//projects//{id}"), "get_pjs_id");
    }

    #[test]
    fn test_repository_segments_stay_full() {
        assert_eq!(
            tool_name("POST", "/projects/{id}/repository/commits/{sha}/cherry_pick"),
            "post_pjs_id_repository_commits_sha_cherry_pick"
        );
    }
}
