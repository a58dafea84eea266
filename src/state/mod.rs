pub mod ansi_codes;
pub mod bash_state;
pub mod persistence;
pub mod pty;
pub mod terminal;

pub use bash_state::BashState;
pub use persistence::{
    delete_bash_state, get_state_dir, list_saved_states, load_bash_state, save_bash_state,
    BashStateSnapshot,
};
