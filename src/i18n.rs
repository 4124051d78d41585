// SPDX-License-Identifier: MPL-2.0

//! English strings by key. Unknown keys come back as the key itself so a
//! missing translation is visible instead of blank.

pub fn translate(key: &str) -> &str {
    match key {
        "app.loading" => "Loading…",
        "app.followers" => "followers",
        "app.following" => "following",
        "app.posts" => "posts",
        "app.replies" => "Replies",
        "post.blockedAuthor" => "Post by a blocked account",
        "post.notImplemented" => "Not implemented yet",
        "profile.notFound" => "Profile not found",
        "profile.mutuals" => "Mutuals",
        "profile.mutualsTitle" => "You both follow each other",
        "profile.follow" => "Follow",
        "profile.unfollow" => "Unfollow",
        "profile.tabs.all" => "All",
        "profile.tabs.posts" => "Posts",
        "profile.tabs.reposts" => "Reposts",
        "profile.tabs.media" => "Media",
        "profile.tabs.likes" => "Likes",
        "profile.tabs.feeds" => "Feeds",
        "profile.tabs.starterpacks" => "Starter packs",
        "profile.tabs.lists" => "Lists",
        "timeline.empty" => "Nothing here yet",
        "messages.empty" => "No conversations",
        _ => key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_missing_keys() {
        assert_eq!(translate("profile.notFound"), "Profile not found");
        assert_eq!(translate("nope.missing"), "nope.missing");
    }
}
