//! Cache key builders: `<namespace>:<resource>[:<entity>[:<sub-resource>]]`

pub const STEAM_RATE_LIMIT_STATE: &str = "steam:rate_limit_state";
pub const OSRS_WORLD_DATA: &str = "osrs:world_data";

pub fn steam_owned_games(steam_id: &str) -> String {
    format!("steam:owned_games:{}", steam_id)
}

pub fn steam_username(steam_id: &str) -> String {
    format!("steam:username:{}", steam_id)
}

pub fn steam_global_achievements(app_id: u32) -> String {
    format!("steam:global_achievements:{}", app_id)
}

pub fn steam_user_achievements(steam_id: &str, app_id: u32) -> String {
    format!("steam:user_achievements:{}:{}", steam_id, app_id)
}

pub fn osrs_player_stats(rsn: &str, mode: &str) -> String {
    format!("osrs:player_stats:{}:{}", rsn, mode)
}

pub fn osrs_last_xp(rsn: &str, mode: &str) -> String {
    format!("osrs:last_xp:{}:{}", rsn, mode)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_compose_namespace_entity_and_sub_resource() {
        assert_eq!(
            steam_user_achievements("76561197960287930", 440),
            "steam:user_achievements:76561197960287930:440"
        );
        assert_eq!(osrs_player_stats("Zezima", "vanilla"), "osrs:player_stats:Zezima:vanilla");
        assert_eq!(osrs_last_xp("Zezima", "vanilla"), "osrs:last_xp:Zezima:vanilla");
    }
}
