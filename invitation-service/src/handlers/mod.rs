pub mod invitation_handlers;
