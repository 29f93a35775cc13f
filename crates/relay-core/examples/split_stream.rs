use futures::{stream, StreamExt};
use relay_core::{split_stream, SplitOptions, StreamEvent};

#[tokio::main]
async fn main() {
    // A model reply delivered in awkward pieces, markers split across fragments
    let fragments = ["思", "考：用户问的是", "首都。\n\n回", "答：巴黎"]
        .into_iter()
        .map(|f| Ok::<_, std::convert::Infallible>(f.to_string()));

    let events = split_stream(stream::iter(fragments), SplitOptions::new(true));
    futures::pin_mut!(events);

    while let Some(event) = events.next().await {
        match event {
            StreamEvent::Delta(delta) => {
                println!("reasoning={:?} response={:?}", delta.reasoning, delta.response)
            }
            other => println!("{other:?}"),
        }
    }
}
