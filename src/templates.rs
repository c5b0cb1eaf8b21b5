//! Named template assets used by the scene graph
//!
//! Each constant names an image file (without extension) resolved through
//! the template store's search paths. Keeping the names in one place is
//! the contract between scene navigation and the asset directory.

pub const RETURN_BUTTON: &str = "return_button";
pub const CANCEL_BUTTON: &str = "cancel_button";

pub const SINGLE_MODE_COMMAND_TRAINING: &str = "single_mode_command_training";
pub const SINGLE_MODE_COMMAND_RACE: &str = "single_mode_command_race";
pub const SINGLE_MODE_COMMAND_GO_OUT: &str = "single_mode_command_go_out";
pub const SINGLE_MODE_COMMAND_HEALTH_CARE: &str = "single_mode_command_health_care";
pub const SINGLE_MODE_FORMAL_RACE_BANNER: &str = "single_mode_formal_race_banner";
pub const SINGLE_MODE_SCHEDULED_RACE_OPENING_BANNER: &str =
    "single_mode_scheduled_race_opening_banner";
pub const SINGLE_MODE_GO_OUT_FRIEND_ICON: &str = "single_mode_go_out_friend_icon";
pub const SINGLE_MODE_GO_OUT_MENU_TITLE: &str = "single_mode_go_out_menu_title";
pub const SINGLE_MODE_GO_OUT_OPTION_ICON: &str = "single_mode_go_out_option_icon";

pub const SINGLE_MODE_TRAINING_CONFIRM: &str = "single_mode_training_confirm";

pub const SINGLE_MODE_RACE_MENU_FAN_ICON: &str = "single_mode_race_menu_fan_icon";
