//! 抽出した表の表示

use leptos::prelude::*;
use crate::app::SessionSignal;

#[component]
pub fn ResultTable(session: SessionSignal) -> impl IntoView {
    let table = move || session.with(|s| s.table().cloned());

    move || {
        table().map(|table| {
            if table.is_empty() {
                return view! {
                    <div class="result-table">
                        <p class="text-muted">"表データがありません"</p>
                    </div>
                }
                .into_any();
            }

            let header = table.padded(table.header().unwrap_or_default());
            // 行ごとに列数が違っても表の幅に揃える
            let rows: Vec<Vec<String>> = table
                .data_rows()
                .iter()
                .map(|row| table.padded(row))
                .collect();

            view! {
                <div class="result-table">
                    <h2>"抽出結果"</h2>
                    <table>
                        <thead>
                            <tr>
                                {header
                                    .into_iter()
                                    .map(|cell| view! { <th>{cell}</th> })
                                    .collect_view()}
                            </tr>
                        </thead>
                        <tbody>
                            {rows
                                .into_iter()
                                .map(|row| {
                                    view! {
                                        <tr>
                                            {row
                                                .into_iter()
                                                .map(|cell| view! { <td>{cell}</td> })
                                                .collect_view()}
                                        </tr>
                                    }
                                })
                                .collect_view()}
                        </tbody>
                    </table>
                </div>
            }
            .into_any()
        })
    }
}
