//! Property tests: convergence under causal reorderings, remove idempotence
//! and the descending-id tie-break.

use quickcheck_macros::quickcheck;
use rga_reducer::{Message, NoopSink, Replica, State, VertexId, reduce};

const REPLICAS: usize = 3;

/// One local edit: (replica, position seed, character, is_remove)
type Edit = (u8, u8, char, bool);

/// Runs `edits` concurrently on three replicas that share a base document,
/// returning the base messages and each replica's own messages.
fn concurrent_session(edits: &[Edit]) -> (Vec<Message<char>>, Vec<Vec<Message<char>>>) {
    let origin = Replica::new(100);
    let base: Vec<Message<char>> = "base"
        .chars()
        .flat_map(|ch| origin.push(ch).messages)
        .collect();

    let replicas: Vec<Replica<char>> = (1..=REPLICAS as u64).map(Replica::new).collect();
    for replica in &replicas {
        for message in &base {
            replica.apply(message, &mut NoopSink).unwrap();
        }
    }

    let mut produced = vec![Vec::new(); REPLICAS];
    for &(who, seed, ch, is_remove) in edits {
        let who = who as usize % REPLICAS;
        let replica = &replicas[who];
        let len = replica.state().live_len();
        let applied = if is_remove && len > 0 {
            replica.remove_at(seed as usize % len).ok()
        } else {
            replica.insert_at(seed as usize % (len + 1), ch)
        };
        if let Some(applied) = applied {
            produced[who].extend(applied.messages);
        }
    }
    (base, produced)
}

/// Interleaves per-replica streams following `schedule`, keeping each
/// stream's own order (and therefore causal order).
fn interleave(streams: &[Vec<Message<char>>], schedule: &[u8]) -> Vec<Message<char>> {
    let mut cursors = vec![0usize; streams.len()];
    let mut out = Vec::new();
    let mut step = 0;
    loop {
        let pending: Vec<usize> = (0..streams.len())
            .filter(|&i| cursors[i] < streams[i].len())
            .collect();
        if pending.is_empty() {
            return out;
        }
        let pick = schedule.get(step).copied().unwrap_or(0) as usize % pending.len();
        let stream = pending[pick];
        out.push(streams[stream][cursors[stream]].clone());
        cursors[stream] += 1;
        step += 1;
    }
}

fn replay<'a>(messages: impl IntoIterator<Item = &'a Message<char>>) -> State<char> {
    messages
        .into_iter()
        .fold(State::first(), |state, message| reduce(message, state, &mut NoopSink))
}

#[quickcheck]
fn converges_under_any_causal_interleaving(edits: Vec<Edit>, schedule: Vec<u8>) -> bool {
    let (base, streams) = concurrent_session(&edits);

    let canonical = replay(base.iter().chain(streams.iter().flatten()));
    let shuffled_order = interleave(&streams, &schedule);
    let shuffled = replay(base.iter().chain(shuffled_order.iter()));
    let reversed_order: Vec<Message<char>> = streams.iter().rev().flatten().cloned().collect();
    let reversed = replay(base.iter().chain(reversed_order.iter()));

    canonical.value_of() == shuffled.value_of() && canonical.value_of() == reversed.value_of()
}

#[quickcheck]
fn removes_may_arrive_before_their_inserts(edits: Vec<Edit>) -> bool {
    let (base, streams) = concurrent_session(&edits);
    let all: Vec<&Message<char>> = base.iter().chain(streams.iter().flatten()).collect();

    // Deliver every remove first, then everything else in order
    let removes = all.iter().filter(|m| m.remove.is_some()).copied();
    let inserts = all.iter().filter(|m| m.remove.is_none()).copied();
    let early = replay(removes.chain(inserts).chain(all.iter().copied()));

    early.value_of() == replay(all.iter().copied()).value_of()
}

#[quickcheck]
fn removing_twice_equals_removing_once(text: String, seed: usize) -> bool {
    let replica = Replica::new(1);
    for ch in text.chars() {
        replica.push(ch);
    }
    let state = replica.state();
    let Some((target, _)) = state.iter().nth(seed % (state.live_len() + 1)) else {
        return true;
    };

    let remove = Message::remove(target);
    let once = reduce(&remove, state, &mut NoopSink);
    let twice = reduce(&remove, once.clone(), &mut NoopSink);
    once.value_of() == twice.value_of() && once == twice
}

#[quickcheck]
fn larger_sibling_lands_closer_to_anchor(a: u64, b: u64, ca: char, cb: char) -> bool {
    if a == b {
        return true;
    }
    let anchor = VertexId::new(0, 0);
    let (high, low) = if a > b { (a, b) } else { (b, a) };
    let high_id = VertexId::new(high, 1);
    let low_id = VertexId::new(low, 1);

    let base = reduce(
        &Message::insert(None, Some('^'), anchor),
        State::first(),
        &mut NoopSink,
    );
    let insert_high = Message::insert(Some(anchor), Some(ca), high_id);
    let insert_low = Message::insert(Some(anchor), Some(cb), low_id);

    let high_first = reduce(&insert_high, base.clone(), &mut NoopSink);
    let first = reduce(&insert_low, high_first, &mut NoopSink);
    let low_first = reduce(&insert_low, base, &mut NoopSink);
    let second = reduce(&insert_high, low_first, &mut NoopSink);

    first == second
        && first.position_of(high_id) == Some(1)
        && first.position_of(low_id) == Some(2)
}
