pub mod common;

#[cfg(test)]
mod test_action_order;
#[cfg(test)]
mod test_effects_handler;
#[cfg(test)]
mod test_flee;
#[cfg(test)]
mod test_items;
#[cfg(test)]
mod test_mega;
#[cfg(test)]
mod test_perish_song;
#[cfg(test)]
mod test_protect;
#[cfg(test)]
mod test_turn_flow;
