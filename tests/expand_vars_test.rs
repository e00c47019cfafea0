//! Tests for environment variable expansion in configured paths

use famtree::config::expand_env_vars;

#[test]
fn given_path_with_dollar_var_when_expanding_then_substitutes() {
    // Arrange
    std::env::set_var("FAMTREE_TEST_HOME", "/home/user");

    // Act
    let result = expand_env_vars("$FAMTREE_TEST_HOME/kin/members.json");

    // Assert
    assert_eq!(result, "/home/user/kin/members.json");

    // Cleanup
    std::env::remove_var("FAMTREE_TEST_HOME");
}

#[test]
fn given_path_with_braced_var_when_expanding_then_substitutes() {
    std::env::set_var("FAMTREE_TEST_DIR", "/var/data");

    let result = expand_env_vars("${FAMTREE_TEST_DIR}/roster.toml");

    assert_eq!(result, "/var/data/roster.toml");
    std::env::remove_var("FAMTREE_TEST_DIR");
}

#[test]
fn given_unknown_var_when_expanding_then_input_is_kept() {
    let result = expand_env_vars("$FAMTREE_TEST_SURELY_UNSET/members.json");

    assert_eq!(result, "$FAMTREE_TEST_SURELY_UNSET/members.json");
}

#[test]
fn given_plain_path_when_expanding_then_unchanged() {
    assert_eq!(expand_env_vars("/srv/members.json"), "/srv/members.json");
}
